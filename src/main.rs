use clap::{Args, Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use fhir::{BundleResource, Resource, ResourceType};
use intake_core::config::{
    consent_delay_from_env_value, path_from_env_value, text_from_env_value,
};
use intake_core::constants::{DEFAULT_HOSPITAL_ID, DEFAULT_PRACTITIONER};
use intake_core::{
    ConsentStatus, IntakeConfig, IntakeResult, IntakeSession, Outcome, RecordField,
    SubmissionSink,
};

#[derive(Parser)]
#[command(name = "intake")]
#[command(about = "Clinical intake FHIR document builder")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Search the diagnosis code table
    Lookup {
        /// Name, local code or description fragment (at least 3 characters)
        query: String,
    },
    /// Generate one resource and print it as JSON
    Generate {
        /// Patient, Condition, Observation, Encounter, Bundle or Consent
        section: String,
        #[command(flatten)]
        record: RecordArgs,
    },
    /// Save, validate, obtain consent and submit; prints the submitted bundle
    Run {
        #[command(flatten)]
        record: RecordArgs,
    },
}

/// Intake form values. A known ABHA ID auto-fills the identity fields.
#[derive(Args)]
struct RecordArgs {
    /// 14-digit ABHA ID
    #[arg(long)]
    health_id: Option<String>,
    #[arg(long)]
    name: Option<String>,
    /// Date of birth (YYYY-MM-DD)
    #[arg(long)]
    birth_date: Option<String>,
    /// Male, Female or Other
    #[arg(long)]
    gender: Option<String>,
    #[arg(long)]
    phone: Option<String>,
    #[arg(long)]
    email: Option<String>,
    #[arg(long)]
    address: Option<String>,
    /// Body weight in kg
    #[arg(long)]
    weight: Option<String>,
    #[arg(long)]
    height: Option<String>,
    #[arg(long)]
    blood_pressure: Option<String>,
    #[arg(long)]
    follow_up_date: Option<String>,
    #[arg(long)]
    notes: Option<String>,
    /// Local diagnosis code, e.g. AYU-001
    #[arg(long)]
    diagnosis: Option<String>,
}

/// Prints each submitted bundle as canonical JSON on stdout.
struct StdoutSink;

impl SubmissionSink for StdoutSink {
    fn submit(&mut self, bundle: &BundleResource) -> IntakeResult<()> {
        let json = Resource::Bundle(bundle.clone()).render()?;
        println!("{json}");
        Ok(())
    }
}

/// Main entry point for the intake CLI
///
/// # Environment Variables
/// - `INTAKE_CONSENT_DELAY_MS`: simulated consent round trip (default: 10000)
/// - `INTAKE_PRACTITIONER`: practitioner named on encounters (default: "Dr. Sarah Johnson")
/// - `INTAKE_HOSPITAL_ID`: hospital identifier pre-filled on the form (default: "HSP-2024-001")
/// - `INTAKE_TERMINOLOGY_FILE`: optional YAML diagnosis table replacing the built-in one
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env().add_directive("intake=info".parse()?),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    let config = load_config()?;

    match cli.command {
        Some(Commands::Lookup { query }) => {
            let session = IntakeSession::from_config(config)?;
            let hits = session.search_diagnoses(&query);
            if hits.is_empty() {
                println!("No matching diagnoses.");
            }
            for entry in hits {
                println!(
                    "{}: {} (TM2 {} {}, MMS {} {})",
                    entry.local_code,
                    entry.name,
                    entry.icd11_tm2.code,
                    entry.icd11_tm2.name,
                    entry.icd11_mms.code,
                    entry.icd11_mms.name
                );
            }
        }
        Some(Commands::Generate { section, record }) => {
            let section: ResourceType = section.parse()?;
            let mut session = IntakeSession::from_config(config)?;
            fill_session(&mut session, record)?;
            session.save_patient()?;
            println!("{}", session.render(section)?);
        }
        Some(Commands::Run { record }) => {
            let mut session = IntakeSession::from_config(config)?;
            fill_session(&mut session, record)?;
            run_workflow(&mut session).await?;
        }
        None => {
            println!("Use 'intake --help' for commands");
        }
    }

    Ok(())
}

fn load_config() -> anyhow::Result<IntakeConfig> {
    let consent_delay =
        consent_delay_from_env_value(std::env::var("INTAKE_CONSENT_DELAY_MS").ok())?;
    let practitioner = text_from_env_value(
        std::env::var("INTAKE_PRACTITIONER").ok(),
        DEFAULT_PRACTITIONER,
    )?;
    let hospital_id =
        text_from_env_value(std::env::var("INTAKE_HOSPITAL_ID").ok(), DEFAULT_HOSPITAL_ID)?;
    let terminology_file = path_from_env_value(std::env::var("INTAKE_TERMINOLOGY_FILE").ok());

    Ok(IntakeConfig::new(
        consent_delay,
        practitioner,
        hospital_id,
        terminology_file,
    )?)
}

fn fill_session(session: &mut IntakeSession, record: RecordArgs) -> anyhow::Result<()> {
    if let Some(health_id) = record.health_id.as_deref() {
        if session.set_health_id(health_id) {
            tracing::info!("++ Known patient, identity fields auto-filled");
        }
    }

    let fields = [
        (RecordField::Name, record.name),
        (RecordField::BirthDate, record.birth_date),
        (RecordField::Gender, record.gender),
        (RecordField::Phone, record.phone),
        (RecordField::Email, record.email),
        (RecordField::Address, record.address),
        (RecordField::Weight, record.weight),
        (RecordField::Height, record.height),
        (RecordField::BloodPressure, record.blood_pressure),
        (RecordField::FollowUpDate, record.follow_up_date),
        (RecordField::Notes, record.notes),
    ];
    for (field, value) in fields {
        if let Some(value) = value {
            session.set_field(field, &value)?;
        }
    }

    if let Some(code) = record.diagnosis.as_deref() {
        session.select_diagnosis(code)?;
    }
    Ok(())
}

async fn run_workflow(session: &mut IntakeSession) -> anyhow::Result<()> {
    session.save_patient()?;

    session.request_validation()?;
    print_state(session)?;

    let mut updates = session.subscribe();
    if let Outcome::Rejected(reason) = session.request_consent()? {
        anyhow::bail!("consent request rejected: {reason}");
    }
    print_state(session)?;
    tracing::info!(
        "++ Waiting {} ms for consent",
        session.config().consent_delay().as_millis()
    );
    updates
        .wait_for(|state| state.consent == ConsentStatus::Granted)
        .await?;
    print_state(session)?;

    if let Outcome::Rejected(reason) = session.submit(&mut StdoutSink)? {
        anyhow::bail!("submission rejected: {reason}");
    }
    print_state(session)?;
    Ok(())
}

fn print_state(session: &IntakeSession) -> anyhow::Result<()> {
    eprintln!("workflow: {}", serde_json::to_string(&session.state())?);
    Ok(())
}
