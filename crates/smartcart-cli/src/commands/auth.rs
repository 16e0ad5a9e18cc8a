use clap::Subcommand;
use smartcart_core::oracle::gemini::{find_api_key, KeySource};
use smartcart_core::GeminiOracle;

#[derive(Subcommand)]
pub enum AuthAction {
    /// Gemini: login / logout / status
    Gemini {
        #[command(subcommand)]
        action: AuthOp,
    },
}

#[derive(Subcommand)]
pub enum AuthOp {
    /// Store an API key in the OS keyring
    Login {
        /// API key
        #[arg(long)]
        token: Option<String>,
    },
    /// Remove the stored API key
    Logout,
    /// Check where the API key comes from
    Status,
}

pub fn run(action: AuthAction) -> Result<(), Box<dyn std::error::Error>> {
    match action {
        AuthAction::Gemini { action: op } => handle_gemini(op),
    }
}

fn handle_gemini(op: AuthOp) -> Result<(), Box<dyn std::error::Error>> {
    match op {
        AuthOp::Login { token } => {
            let tok = token.ok_or("--token required for Gemini")?;
            GeminiOracle::store_api_key(&tok)?;
            println!("Gemini API key saved");
        }
        AuthOp::Logout => {
            GeminiOracle::forget_api_key()?;
            println!("Gemini API key removed");
        }
        AuthOp::Status => match find_api_key() {
            Some((_, KeySource::Environment(var))) => println!("authenticated (from ${var})"),
            Some((_, KeySource::Keyring)) => println!("authenticated (from keyring)"),
            None => println!("not authenticated"),
        },
    }
    Ok(())
}
