use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;

use crate::client::DEFAULT_BASE_URL;

const SESSION_FILE: &str = "session.json";

/// Persisted CLI session: which server, and who is signed in there
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    pub server_url: String,
    pub token: Option<String>,
    pub shop_id: Option<i32>,
    pub shop_name: Option<String>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl Default for Session {
    fn default() -> Self {
        Self {
            server_url: DEFAULT_BASE_URL.to_string(),
            token: None,
            shop_id: None,
            shop_name: None,
            updated_at: None,
        }
    }
}

impl Session {
    pub fn sign_in(&mut self, token: Option<String>, shop_id: i32, shop_name: &str) {
        self.token = token;
        self.shop_id = Some(shop_id);
        self.shop_name = Some(shop_name.to_string());
        self.updated_at = Some(Utc::now());
    }

    pub fn sign_out(&mut self) {
        self.token = None;
        self.shop_id = None;
        self.shop_name = None;
        self.updated_at = Some(Utc::now());
    }

    /// Signed-in shop id, or an error telling the user to log in
    pub fn require_shop_id(&self) -> anyhow::Result<i32> {
        self.shop_id
            .ok_or_else(|| anyhow::anyhow!("Not logged in. Run `discountify-cli auth login` first"))
    }
}

pub fn get_config_dir() -> anyhow::Result<PathBuf> {
    let config_dir = if let Ok(custom_dir) = std::env::var("DISCOUNTIFY_CLI_CONFIG_DIR") {
        PathBuf::from(custom_dir)
    } else {
        let home = std::env::var("HOME").map_err(|_| anyhow::anyhow!("HOME environment variable not set"))?;
        PathBuf::from(home).join(".config").join("discountify").join("cli")
    };

    if !config_dir.exists() {
        fs::create_dir_all(&config_dir)?;
    }

    Ok(config_dir)
}

pub fn load_session() -> anyhow::Result<Session> {
    let session_file = get_config_dir()?.join(SESSION_FILE);

    if !session_file.exists() {
        return Ok(Session::default());
    }

    let content = fs::read_to_string(session_file)?;
    let session: Session = serde_json::from_str(&content)?;
    Ok(session)
}

pub fn save_session(session: &Session) -> anyhow::Result<()> {
    let session_file = get_config_dir()?.join(SESSION_FILE);

    let content = serde_json::to_string_pretty(session)?;
    fs::write(session_file, content)?;
    Ok(())
}
