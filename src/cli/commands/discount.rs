use clap::Subcommand;
use serde_json::json;

use crate::cli::utils::{discount_line, listing_line, output_data, output_notices, output_success, print_listings, today};
use crate::cli::Context;
use crate::client::{DiscountAction, DiscountFormPatch, DiscountStore};
use crate::filter::{DiscountFilter, DiscountQuery};

#[derive(Subcommand)]
pub enum DiscountCommands {
    #[command(about = "Browse the public discount board")]
    List {
        #[arg(long, help = "Case-insensitive match on title or shop name")]
        search: Option<String>,
        #[arg(long, help = "Category contains this text (case-insensitive)")]
        category: Option<String>,
        #[arg(long, help = "City contains this text (case-insensitive)")]
        city: Option<String>,
        #[arg(long, help = "Validity window: today, tomorrow or week")]
        date: Option<String>,
    },

    #[command(about = "List the signed-in shop's discounts")]
    Mine {
        #[arg(long, help = "Case-insensitive match on title or shop name")]
        search: Option<String>,
    },

    #[command(about = "Show one discount")]
    Show {
        #[arg(help = "Discount id")]
        id: i32,
    },

    #[command(about = "Publish a discount for your shop")]
    Add {
        #[arg(long)]
        title: String,
        #[arg(long, help = "Percentage off, 0 to 100")]
        percentage: String,
        #[arg(long)]
        category: String,
        #[arg(long, help = "First valid day (YYYY-MM-DD)")]
        start: String,
        #[arg(long, help = "Last valid day (YYYY-MM-DD)")]
        end: String,
    },

    #[command(about = "Edit one of your discounts")]
    Update {
        #[arg(help = "Discount id")]
        id: i32,
        #[arg(long)]
        title: Option<String>,
        #[arg(long)]
        percentage: Option<String>,
        #[arg(long)]
        category: Option<String>,
        #[arg(long)]
        start: Option<String>,
        #[arg(long)]
        end: Option<String>,
    },

    #[command(about = "Delete one of your discounts")]
    Delete {
        #[arg(help = "Discount id")]
        id: i32,
    },
}

pub async fn handle(cmd: DiscountCommands, ctx: &mut Context) -> anyhow::Result<()> {
    let store = DiscountStore::new(ctx.client.clone());

    match cmd {
        DiscountCommands::List {
            search,
            category,
            city,
            date,
        } => {
            let filter = DiscountFilter::try_from(DiscountQuery {
                search,
                category,
                city,
                date,
            })?;
            let listings = store
                .fetch_discounts(filter)
                .await
                .map_err(|e| ctx.fail(e, "Failed to fetch discounts"))?;
            output_data(&ctx.output_format, &listings, || {
                print_listings(&listings, "No discounts match your filters")
            })
        }
        DiscountCommands::Mine { search } => {
            ctx.session.require_shop_id()?;
            let listings = store
                .fetch_my_discounts(search)
                .await
                .map_err(|e| ctx.fail(e, "Failed to fetch your discounts"))?;
            output_data(&ctx.output_format, &listings, || {
                print_listings(&listings, "You have not published any discounts yet")
            })
        }
        DiscountCommands::Show { id } => {
            let listing = store
                .fetch_discount(id)
                .await
                .map_err(|e| ctx.fail(e, "Failed to fetch discount"))?;
            output_data(&ctx.output_format, &listing, || {
                println!("{}", listing_line(&listing, today()))
            })
        }
        DiscountCommands::Add {
            title,
            percentage,
            category,
            start,
            end,
        } => {
            let shop_id = ctx.session.require_shop_id()?;
            store.set_form(DiscountFormPatch {
                title: Some(title),
                discount_percentage: Some(percentage),
                category: Some(category),
                start_date: Some(start),
                end_date: Some(end),
                shop_id: Some(shop_id.to_string()),
            });

            let discount = store
                .add_discount()
                .await
                .map_err(|e| ctx.fail(e, "Failed to add discount"))?;
            output_success(
                &ctx.output_format,
                &format!("Discount #{} published: {}", discount.id, discount.title),
                Some(json!(discount)),
            )
        }
        DiscountCommands::Update {
            id,
            title,
            percentage,
            category,
            start,
            end,
        } => {
            ctx.session.require_shop_id()?;
            let listing = store
                .fetch_discount(id)
                .await
                .map_err(|e| ctx.fail(e, "Failed to fetch discount"))?;
            store.dispatch(DiscountAction::EditDiscount(listing.discount));
            store.set_form(DiscountFormPatch {
                title,
                discount_percentage: percentage,
                category,
                start_date: start,
                end_date: end,
                shop_id: None,
            });

            let discount = store
                .update_discount(id)
                .await
                .map_err(|e| ctx.fail(e, "Failed to update discount"))?;
            output_notices(&ctx.output_format, &store.take_notices());
            output_data(&ctx.output_format, &discount, || {
                println!("{}", discount_line(&discount, today()))
            })
        }
        DiscountCommands::Delete { id } => {
            ctx.session.require_shop_id()?;
            let discount = store
                .delete_discount(id)
                .await
                .map_err(|e| ctx.fail(e, "Failed to delete discount"))?;
            output_success(
                &ctx.output_format,
                &format!("Discount #{} deleted: {}", discount.id, discount.title),
                Some(json!(discount)),
            )
        }
    }
}
