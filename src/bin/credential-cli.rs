use std::path::PathBuf;

use clap::{Parser, Subcommand};
use serde_json::{json, Value};

#[derive(Parser)]
#[command(name = "credential-cli")]
#[command(about = "Management CLI for the Credential Registry Gateway", long_about = None)]
struct Cli {
    #[arg(short, long, env = "GATEWAY_URL", default_value = "http://localhost:8000")]
    url: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Gateway liveness and chain connectivity
    Health,
    /// Bound contract address and network
    Info,
    /// Issue a credential
    Issue {
        #[arg(long)]
        recipient_name: String,
        #[arg(long)]
        recipient_email: String,
        #[arg(long)]
        issuer_name: String,
        #[arg(long)]
        credential_type: String,
        #[arg(long, default_value = "")]
        description: String,
        #[arg(long)]
        metadata_uri: Option<String>,
        #[arg(long)]
        issuer_address: String,
    },
    /// Check whether a credential exists and is valid
    Verify { credential_id: String },
    /// Fetch the full credential record
    Get { credential_id: String },
    /// Revoke a credential
    Revoke {
        credential_id: String,
        #[arg(long)]
        issuer_address: String,
    },
    /// Authorize an issuer (owner only)
    Authorize {
        #[arg(long)]
        issuer_address: String,
        #[arg(long)]
        owner_address: String,
    },
    /// List credentials issued by an address
    IssuerCredentials { issuer_address: String },
    /// List credentials received by an email
    RecipientCredentials { email: String },
    /// Check whether an address may issue
    Authorized { issuer_address: String },
    /// Verification QR code as a data URI
    Qr { credential_id: String },
    /// Download the PDF certificate
    Pdf {
        credential_id: String,
        #[arg(short, long)]
        out: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let client = reqwest::Client::new();
    let base = cli.url.trim_end_matches('/');

    let res = match cli.command {
        Commands::Health => client.get(format!("{}/health", base)).send().await?,
        Commands::Info => client.get(format!("{}/api/contract/info", base)).send().await?,
        Commands::Issue {
            recipient_name,
            recipient_email,
            issuer_name,
            credential_type,
            description,
            metadata_uri,
            issuer_address,
        } => {
            let body = json!({
                "recipient_name": recipient_name,
                "recipient_email": recipient_email,
                "issuer_name": issuer_name,
                "credential_type": credential_type,
                "description": description,
                "metadata_uri": metadata_uri,
                "issuer_address": issuer_address,
            });
            client
                .post(format!("{}/api/credentials/issue", base))
                .json(&body)
                .send()
                .await?
        }
        Commands::Verify { credential_id } => {
            client
                .get(format!("{}/api/credentials/verify/{}", base, credential_id))
                .send()
                .await?
        }
        Commands::Get { credential_id } => {
            client
                .get(format!("{}/api/credentials/{}", base, credential_id))
                .send()
                .await?
        }
        Commands::Revoke {
            credential_id,
            issuer_address,
        } => {
            client
                .post(format!("{}/api/credentials/revoke/{}", base, credential_id))
                .query(&[("issuer_address", issuer_address)])
                .send()
                .await?
        }
        Commands::Authorize {
            issuer_address,
            owner_address,
        } => {
            client
                .post(format!("{}/api/issuers/authorize", base))
                .json(&json!({
                    "issuer_address": issuer_address,
                    "owner_address": owner_address,
                }))
                .send()
                .await?
        }
        Commands::IssuerCredentials { issuer_address } => {
            client
                .get(format!("{}/api/issuers/{}/credentials", base, issuer_address))
                .send()
                .await?
        }
        Commands::RecipientCredentials { email } => {
            let mut url = reqwest::Url::parse(base)?;
            url.path_segments_mut()
                .map_err(|_| "gateway URL cannot be a base")?
                .pop_if_empty()
                .extend(["api", "recipients", email.as_str(), "credentials"]);
            client.get(url).send().await?
        }
        Commands::Authorized { issuer_address } => {
            client
                .get(format!("{}/api/issuers/{}/authorized", base, issuer_address))
                .send()
                .await?
        }
        Commands::Qr { credential_id } => {
            client
                .get(format!("{}/api/credentials/{}/qr", base, credential_id))
                .send()
                .await?
        }
        Commands::Pdf { credential_id, out } => {
            let res = client
                .get(format!("{}/api/credentials/{}/pdf", base, credential_id))
                .send()
                .await?;
            let out = out.unwrap_or_else(|| PathBuf::from(format!("credential-{}.pdf", credential_id)));
            return save_pdf(res, out).await;
        }
    };

    print_response(res).await
}

async fn print_response(res: reqwest::Response) -> Result<(), Box<dyn std::error::Error>> {
    let status = res.status();
    if !status.is_success() {
        eprintln!("Error: Gateway returned status {}", status);
        if let Ok(text) = res.text().await {
            eprintln!("Response: {}", text);
        }
        std::process::exit(1);
    }

    let json: Value = res.json().await?;
    println!("{}", serde_json::to_string_pretty(&json)?);
    Ok(())
}

async fn save_pdf(res: reqwest::Response, out: PathBuf) -> Result<(), Box<dyn std::error::Error>> {
    if !res.status().is_success() {
        return print_response(res).await;
    }
    let bytes = res.bytes().await?;
    tokio::fs::write(&out, &bytes).await?;
    println!("Saved {} bytes to {}", bytes.len(), out.display());
    Ok(())
}
