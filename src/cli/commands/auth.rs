use clap::Subcommand;
use serde_json::json;

use crate::cli::utils::{output_data, output_notices, output_success, value_or_prompt};
use crate::cli::Context;
use crate::client::AuthStore;

#[derive(Subcommand)]
pub enum AuthCommands {
    #[command(about = "Login as a shop")]
    Login {
        #[arg(long, help = "Shop email")]
        email: String,
        #[arg(long, help = "Password (will prompt if not provided)")]
        password: Option<String>,
    },

    #[command(about = "Logout and forget the saved session")]
    Logout,

    #[command(about = "Show which shop the saved session belongs to")]
    Status,
}

pub async fn handle(cmd: AuthCommands, ctx: &mut Context) -> anyhow::Result<()> {
    let store = AuthStore::new(ctx.client.clone());

    match cmd {
        AuthCommands::Login { email, password } => {
            let password = value_or_prompt(password, "Password")?;
            let shop = store
                .login(&email, &password)
                .await
                .map_err(|e| ctx.fail(e, "Failed to login"))?;

            ctx.session.sign_in(ctx.client.token(), shop.id, &shop.shop_name);
            output_success(
                &ctx.output_format,
                &format!("Logged in as {} (#{})", shop.shop_name, shop.id),
                Some(json!(shop)),
            )
        }
        AuthCommands::Logout => {
            store.logout().await;
            ctx.session.sign_out();
            output_notices(&ctx.output_format, &store.take_notices());
            if matches!(ctx.output_format, crate::cli::OutputFormat::Json) {
                output_success(&ctx.output_format, "Logged out successfully", None)?;
            }
            Ok(())
        }
        AuthCommands::Status => {
            let principal = store.check_auth().await;
            match &principal {
                Some(p) => ctx.session.sign_in(ctx.client.token(), p.id, &p.shop_name),
                None => ctx.session.sign_out(),
            }
            output_data(&ctx.output_format, &json!({ "principal": principal }), || match &principal {
                Some(p) => println!("Logged in as {} (#{}) on {}", p.shop_name, p.id, ctx.session.server_url),
                None => println!("Not logged in ({})", ctx.session.server_url),
            })
        }
    }
}
