use std::sync::Arc;

use anyhow::{bail, Context};
use common::utils::logging::{init_logging, init_logging_default};
use configs::AppConfig;
use dotenvy::dotenv;
use serde_json::{json, Value};
use service::client::http::ApperHttpClient;
use service::group_gift_service::GroupGiftService;
use service::price_alert_service::PriceAlertService;
use service::reminder_service::{ReminderService, DEFAULT_UPCOMING_DAYS};
use service::saved_gift_service::SavedGiftService;
use service::social_gift_service::SocialGiftService;
use tracing::{error, info};
use uuid::Uuid;

const USAGE: &str = "usage: giftwise <reminders [days] | stats | alerts | social>";

enum Report {
    Reminders(i64),
    Stats,
    Alerts,
    Social,
}

impl Report {
    fn from_args(mut args: impl Iterator<Item = String>) -> anyhow::Result<Self> {
        match args.next().as_deref() {
            Some("reminders") => {
                let days = match args.next() {
                    Some(d) => d.parse().with_context(|| format!("invalid day count: {d}"))?,
                    None => DEFAULT_UPCOMING_DAYS,
                };
                Ok(Report::Reminders(days))
            }
            Some("stats") => Ok(Report::Stats),
            Some("alerts") => Ok(Report::Alerts),
            Some("social") => Ok(Report::Social),
            _ => bail!(USAGE),
        }
    }
}

/// 服务实例集合，共享同一个 HTTP 客户端
struct Services {
    group_gifts: GroupGiftService<ApperHttpClient>,
    price_alerts: Arc<PriceAlertService<ApperHttpClient>>,
    reminders: ReminderService<ApperHttpClient>,
    saved_gifts: SavedGiftService<ApperHttpClient>,
    social: SocialGiftService<ApperHttpClient>,
}

impl Services {
    fn new(client: Arc<ApperHttpClient>) -> Self {
        let price_alerts = Arc::new(PriceAlertService::new(client.clone()));
        Self {
            group_gifts: GroupGiftService::new(client.clone()),
            saved_gifts: SavedGiftService::new(client.clone(), price_alerts.clone()),
            reminders: ReminderService::new(client.clone()),
            social: SocialGiftService::new(client),
            price_alerts,
        }
    }

    async fn report(&self, report: Report) -> anyhow::Result<Value> {
        let value = match report {
            Report::Reminders(days) => json!({ "days": days, "reminders": self.reminders.get_upcoming(days).await }),
            Report::Stats => json!({
                "groupGifts": self.group_gifts.get_contribution_stats().await,
                "social": self.social.get_social_stats().await,
            }),
            Report::Alerts => json!({
                "alerts": self.price_alerts.get_all().await?,
                "watchedGifts": self.saved_gifts.get_price_alerts().await,
                "settings": self.price_alerts.get_notification_settings().await,
            }),
            Report::Social => json!({
                "friends": self.social.get_friends().await,
                "wishlists": self.social.get_shared_wishlists().await,
                "activities": self.social.get_gift_activities().await,
            }),
        };
        Ok(value)
    }
}

fn load_config() -> anyhow::Result<AppConfig> {
    // 加载 .env（APPER_* 与 RUST_LOG 均可从中读取）
    dotenv().ok();
    match AppConfig::load_and_validate() {
        Ok(cfg) => {
            init_logging(cfg.logging.format);
            Ok(cfg)
        }
        Err(e) => {
            init_logging_default();
            error!(service = "giftwise", event = "config_invalid", error = %e, "failed to load configuration");
            Err(e)
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let report = Report::from_args(std::env::args().skip(1))?;
    let cfg = load_config()?;

    let service_id = Uuid::new_v4();
    let pid = std::process::id();

    // Panic 钩子：捕获异常并输出错误日志
    std::panic::set_hook(Box::new(move |info| {
        error!(service = "giftwise", event = "panic", %service_id, pid, message = %info, "unhandled panic occurred");
    }));

    info!(
        service = "giftwise",
        event = "start",
        %service_id,
        pid,
        version = env!("CARGO_PKG_VERSION"),
        base_url = %cfg.apper.base_url,
        "giftwise starting"
    );

    let client = Arc::new(ApperHttpClient::new(&cfg.apper)?);
    let services = Services::new(client);
    let value = services.report(report).await?;
    println!("{}", serde_json::to_string_pretty(&value)?);

    info!(service = "giftwise", event = "stop", %service_id, "report printed");
    Ok(())
}
