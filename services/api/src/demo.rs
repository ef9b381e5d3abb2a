use crate::infra::{redact_email, redact_identifier};
use clap::Args;
use ridgeline::app::MemoryBackend;
use ridgeline::config::AppConfig;
use ridgeline::error::AppError;
use ridgeline::identity::{IdentityProvider, Registration};
use ridgeline::storage::{ObjectStorage, ObjectUpload};
use ridgeline::workflows::access::GrantOutcome;
use ridgeline::workflows::permits::{
    IdType, PermitApplication, PermitStatus, PermitStatusView, PermitSubmission, PermitUpdate,
};

const DEMO_ADMIN_EMAIL: &str = "ops@ridgeline.example";
const DEMO_ADMIN_PASSWORD: &str = "demo-admin-passphrase";

#[derive(Args, Debug)]
pub(crate) struct DemoArgs {
    /// Rider email used for the sample application.
    #[arg(long, default_value = "rider@example.com")]
    pub(crate) rider_email: String,
    /// Destination named on the sample permit.
    #[arg(long, default_value = "Leh-Ladakh")]
    pub(crate) destination: String,
    /// Reject the application instead of approving it.
    #[arg(long)]
    pub(crate) reject: bool,
}

/// What the walkthrough produced, used for rendering and tests.
#[derive(Debug)]
pub(crate) struct DemoOutcome {
    pub(crate) bootstrap: GrantOutcome,
    pub(crate) permit: PermitApplication,
    pub(crate) lookup: Vec<PermitStatusView>,
    pub(crate) document_path: String,
    pub(crate) document_link_issued: bool,
}

pub(crate) fn run_demo(args: DemoArgs) -> Result<(), AppError> {
    let config = AppConfig::load()?;
    let backend = MemoryBackend::in_memory(&config);

    println!("Ridgeline permit workflow demo (sensitive fields redacted)");
    let outcome = walkthrough(&backend, &args)?;
    render(&outcome);
    Ok(())
}

pub(crate) fn walkthrough(
    backend: &MemoryBackend,
    args: &DemoArgs,
) -> Result<DemoOutcome, AppError> {
    let identity = backend.identity();
    identity.sign_up(Registration {
        email: DEMO_ADMIN_EMAIL.to_string(),
        password: DEMO_ADMIN_PASSWORD.to_string(),
        name: Some("Ridgeline Ops".to_string()),
    })?;
    let session = identity.sign_in(DEMO_ADMIN_EMAIL, DEMO_ADMIN_PASSWORD)?;
    let token = Some(session.access_token.as_str());

    let access = backend.access();
    let bootstrap = access.grant_admin(None, &session.user.id.0)?;

    let stored = backend.objects().upload(ObjectUpload {
        folder: "permits".to_string(),
        file_name: "driving-licence.pdf".to_string(),
        content_type: mime::APPLICATION_PDF,
        bytes: b"%PDF-1.4 sample licence".to_vec(),
    })?;

    let permits = backend.permits();
    let submitted = permits.submit(PermitSubmission {
        full_name: "Tenzin Norbu".to_string(),
        email: args.rider_email.clone(),
        phone: Some("+91 98765 43210".to_string()),
        destination: args.destination.clone(),
        id_type: Some(IdType::Passport),
        id_number: "Z1234567".to_string(),
        dl_number: "HP-0120190012345".to_string(),
        document_path: stored.path.clone(),
    })?;

    let verified = permits.transition(
        token,
        &submitted.id,
        PermitUpdate {
            status: Some(PermitStatus::Verified),
            admin_notes: Some("Licence checked against scan".to_string()),
        },
    )?;
    let decision = if args.reject {
        PermitStatus::Rejected
    } else {
        PermitStatus::Approved
    };
    let permit = permits.transition(
        token,
        &verified.id,
        PermitUpdate {
            status: Some(decision),
            admin_notes: None,
        },
    )?;

    let document_link_issued = permits.document_url(token, &permit.id).is_ok();
    let lookup = permits.lookup_by_email(&args.rider_email)?;

    Ok(DemoOutcome {
        bootstrap,
        permit,
        lookup,
        document_path: stored.path,
        document_link_issued,
    })
}

fn render(outcome: &DemoOutcome) {
    let DemoOutcome {
        bootstrap,
        permit,
        lookup,
        document_path,
        document_link_issued,
    } = outcome;

    println!(
        "- Admin {} ({:?})",
        redact_email(DEMO_ADMIN_EMAIL),
        bootstrap
    );
    println!("- Uploaded licence scan to {document_path}");
    println!(
        "- Permit {} for {} -> {} (id {}, licence {})",
        permit.id,
        redact_email(&permit.email),
        permit.destination,
        redact_identifier(&permit.id_number),
        redact_identifier(&permit.dl_number)
    );
    if let Some(notes) = &permit.admin_notes {
        println!("  Reviewer notes: {notes}");
    }
    println!(
        "  Signed document link: {}",
        if *document_link_issued {
            "issued"
        } else {
            "unavailable"
        }
    );

    match serde_json::to_string_pretty(lookup) {
        Ok(json) => println!("  Public status lookup:\n{json}"),
        Err(err) => println!("  Public status lookup unavailable: {err}"),
    }
}
