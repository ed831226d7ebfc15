use anyhow::{bail, Result};
use clap::Parser;
use client_core::{ContactFormController, FormOutcome, HttpContactBackend, SubmissionClient};
use shared::validation::ContactField;

/// Fill in the contact form and submit it against a running site backend.
#[derive(Parser, Debug)]
struct Args {
    #[arg(long, default_value = "http://127.0.0.1:8080")]
    server_url: String,
    #[arg(long, env = "CONTACT_API_KEY")]
    api_key: Option<String>,
    #[arg(long)]
    name: String,
    #[arg(long)]
    email: String,
    #[arg(long)]
    company: Option<String>,
    #[arg(long)]
    message: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt().init();
    let args = Args::parse();

    let mut backend = HttpContactBackend::new(args.server_url);
    if let Some(key) = args.api_key {
        backend = backend.with_api_key(key);
    }
    let client = SubmissionClient::new(backend);

    let mut form = ContactFormController::new();
    form.edit(ContactField::Name, args.name);
    form.edit(ContactField::Email, args.email);
    if let Some(company) = args.company {
        form.edit(ContactField::Company, company);
    }
    form.edit(ContactField::Message, args.message);

    let Some(notice) = form.submit(&client).await else {
        for (field, message) in form.errors() {
            eprintln!("{}: {message}", field.as_str());
        }
        bail!("contact form has invalid fields");
    };

    println!("{}", notice.title);
    println!("{}", notice.description);
    if notice.outcome == FormOutcome::Failed {
        bail!("submission was not stored");
    }
    Ok(())
}
