use clap::Subcommand;
use serde_json::json;

use crate::cli::utils::{output_data, output_notices, output_success, shop_line, value_or_prompt};
use crate::cli::Context;
use crate::client::{ShopFormPatch, ShopStore};

#[derive(Subcommand)]
pub enum ShopCommands {
    #[command(about = "Register a new shop account")]
    Register {
        #[arg(long, help = "Shop name")]
        name: String,
        #[arg(long, help = "Email")]
        email: String,
        #[arg(long, help = "City")]
        city: String,
        #[arg(long, help = "Password (will prompt if not provided)")]
        password: Option<String>,
    },

    #[command(about = "List all shops")]
    List,

    #[command(about = "Show one shop")]
    Show {
        #[arg(help = "Shop id")]
        id: i32,
    },

    #[command(about = "Update your shop's name, email or city")]
    Update {
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        email: Option<String>,
        #[arg(long)]
        city: Option<String>,
    },

    #[command(about = "Change your password")]
    Password {
        #[arg(long, help = "Current password (will prompt if not provided)")]
        current: Option<String>,
        #[arg(long, help = "New password (will prompt if not provided)")]
        new: Option<String>,
    },

    #[command(about = "Delete your shop and all of its discounts")]
    Delete {
        #[arg(long, help = "Confirm the deletion")]
        yes: bool,
    },
}

pub async fn handle(cmd: ShopCommands, ctx: &mut Context) -> anyhow::Result<()> {
    let store = ShopStore::new(ctx.client.clone());

    match cmd {
        ShopCommands::Register {
            name,
            email,
            city,
            password,
        } => {
            let password = value_or_prompt(password, "Password")?;
            let confirm = value_or_prompt(None, "Confirm password")?;
            store.set_form(ShopFormPatch {
                shop_name: Some(name),
                email: Some(email),
                city: Some(city),
                password: Some(password),
                confirm_password: Some(confirm),
                ..Default::default()
            });

            let shop = store
                .register()
                .await
                .map_err(|e| ctx.fail(e, "Failed to register shop"))?;
            output_success(
                &ctx.output_format,
                &format!("Shop account registered successfully ({})", shop_line(&shop)),
                Some(json!(shop)),
            )
        }
        ShopCommands::List => {
            let shops = store
                .fetch_shops()
                .await
                .map_err(|e| ctx.fail(e, "Failed to fetch shops"))?;
            output_data(&ctx.output_format, &shops, || {
                if shops.is_empty() {
                    println!("No shops registered yet");
                }
                for shop in &shops {
                    println!("{}", shop_line(shop));
                }
            })
        }
        ShopCommands::Show { id } => {
            let shop = store
                .fetch_shop(id)
                .await
                .map_err(|e| ctx.fail(e, "Failed to fetch shop"))?;
            output_data(&ctx.output_format, &shop, || {
                println!("{}", shop_line(&shop));
                println!("Member since {}", shop.created_at.format("%b %-d, %Y"));
            })
        }
        ShopCommands::Update { name, email, city } => {
            let id = ctx.session.require_shop_id()?;
            // Start from the saved profile so omitted flags keep their values
            store
                .fetch_shop(id)
                .await
                .map_err(|e| ctx.fail(e, "Failed to fetch shop"))?;
            store.set_form(ShopFormPatch {
                shop_name: name,
                email,
                city,
                ..Default::default()
            });

            let shop = store
                .update_info(id)
                .await
                .map_err(|e| ctx.fail(e, "Failed to update shop"))?;
            ctx.session.shop_name = Some(shop.shop_name.clone());
            output_notices(&ctx.output_format, &store.take_notices());
            output_data(&ctx.output_format, &shop, || println!("{}", shop_line(&shop)))
        }
        ShopCommands::Password { current, new } => {
            let id = ctx.session.require_shop_id()?;
            let current = value_or_prompt(current, "Current password")?;
            let new = value_or_prompt(new, "New password")?;
            store.set_form(ShopFormPatch {
                current_password: Some(current),
                password: Some(new.clone()),
                confirm_password: Some(new),
                ..Default::default()
            });

            store
                .update_password(id)
                .await
                .map_err(|e| ctx.fail(e, "Failed to update password"))?;
            output_success(&ctx.output_format, "Password updated successfully", None)
        }
        ShopCommands::Delete { yes } => {
            let id = ctx.session.require_shop_id()?;
            if !yes {
                anyhow::bail!("Deleting a shop removes all of its discounts; pass --yes to confirm");
            }

            let shop = store
                .delete_shop(id)
                .await
                .map_err(|e| ctx.fail(e, "Failed to delete shop"))?;
            ctx.session.sign_out();
            output_success(
                &ctx.output_format,
                &format!("Shop {} deleted successfully", shop.shop_name),
                Some(json!(shop)),
            )
        }
    }
}
