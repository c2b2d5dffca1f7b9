use std::env;

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{Local, NaiveDateTime, TimeZone};
#[cfg(test)]
use mockall::automock;
use log::info;
use reqwest::{header::CONTENT_TYPE, Client};
use serde::{Deserialize, Serialize};

use crate::config::JiraConfig;
use crate::duration::Duration;
use crate::prompt::Prompt;

/// 課題管理システムに作業時間を記録するためのtrait。
#[cfg_attr(test, automock)]
#[async_trait]
pub trait IssueTracker {
    /// チケットに作業時間を記録する。
    ///
    /// # Arguments
    ///
    /// * `ticket` - チケット番号
    /// * `duration` - 作業時間
    /// * `started` - 作業の開始時間(ローカル時間)
    async fn add_worklog(
        &self,
        ticket: &str,
        duration: &Duration,
        started: &NaiveDateTime,
    ) -> Result<()>;
}

/// Jira APIに送るworklogのリクエスト。
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct WorklogRequest {
    time_spent: String,
    started: String,
}

/// Jira APIのworklogレスポンスをデシリアライズするための構造体。
#[derive(Debug, Deserialize)]
struct WorklogResponse {
    id: String,
}

/// Jira APIと通信するためのクライアント。
///
/// # Examples
///
/// ```
/// let client = JiraClient::new("https://jira.example.com", "jsmith", "secret");
/// client.add_worklog("PROJ-1", &duration, &started).await?;
/// ```
pub struct JiraClient {
    client: Client,
    server: String,
    username: String,
    password: String,
}

impl JiraClient {
    /// 新しい`JiraClient`を返す。
    pub fn new(server: &str, username: &str, password: &str) -> Self {
        Self {
            client: Client::new(),
            server: server.trim_end_matches('/').to_string(),
            username: username.to_string(),
            password: password.to_string(),
        }
    }

    /// 設定から`JiraClient`を作成する。
    ///
    /// サーバーとユーザー名が設定されていない場合は入力を求める。
    /// パスワードが設定されていない場合は環境変数`JIRA_PASSWORD`を使い、それもなければ入力を求める。
    pub fn from_config<P: Prompt>(jira: &JiraConfig, prompt: &mut P) -> Result<Self> {
        let server = match &jira.server {
            Some(server) => server.clone(),
            None => prompt.ask("Jira Server: ")?,
        };
        let username = match &jira.username {
            Some(username) => username.clone(),
            None => prompt.ask("Jira Username: ")?,
        };
        let password = match &jira.password {
            Some(password) => password.clone(),
            None => match env::var("JIRA_PASSWORD") {
                Ok(password) => password,
                Err(_) => prompt.ask_hidden("Jira Password: ")?,
            },
        };

        Ok(Self::new(server.trim(), username.trim(), &password))
    }
}

#[async_trait]
impl IssueTracker for JiraClient {
    async fn add_worklog(
        &self,
        ticket: &str,
        duration: &Duration,
        started: &NaiveDateTime,
    ) -> Result<()> {
        let url = format!("{}/rest/api/2/issue/{}/worklog", self.server, ticket);
        let request = WorklogRequest {
            time_spent: duration.to_string(),
            started: format_started(started)?,
        };
        let worklog = self
            .client
            .post(&url)
            .basic_auth(&self.username, Some(&self.password))
            .header(CONTENT_TYPE, "application/json")
            .json(&request)
            .send()
            .await
            .with_context(|| format!("Failed to send request to Jira API at {}", url))?
            .error_for_status()
            .context("Request returned an error status")?
            .json::<WorklogResponse>()
            .await
            .context("Failed to deserialize response")?;
        info!("Logged {} to {} (worklog {})", duration, ticket, worklog.id);

        Ok(())
    }
}

/// 開始時間をJiraの`started`の形式(`2024-01-10T09:00:00.000+0900`)にする。
fn format_started(started: &NaiveDateTime) -> Result<String> {
    let local = Local
        .from_local_datetime(started)
        .earliest()
        .with_context(|| format!("Local time does not exist: {}", started))?;

    Ok(local.format("%Y-%m-%dT%H:%M:%S%.3f%z").to_string())
}
