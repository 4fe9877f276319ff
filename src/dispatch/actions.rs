use futures::future::BoxFuture;
use tokio::process::Command;

use crate::dispatch::{ActionError, BlinkAction, BlinkNotice};

/// 只写日志的动作，未配置外部动作时使用
#[derive(Debug, Clone, Default)]
pub struct LogAction;

impl BlinkAction for LogAction {
    fn name(&self) -> &'static str {
        "log"
    }

    fn trigger<'a>(&'a self, notice: &'a BlinkNotice) -> BoxFuture<'a, Result<(), ActionError>> {
        Box::pin(async move {
            tracing::info!(
                session_id = %notice.session_id,
                blink_number = notice.blink_number,
                "Blink #{} detected",
                notice.blink_number
            );
            Ok(())
        })
    }
}

/// 执行外部程序，例如 `xdotool key Return`
///
/// 通知内容通过 `BLINK_NUMBER` 与 `BLINK_SESSION_ID` 环境变量传给子进程。
#[derive(Debug, Clone)]
pub struct CommandAction {
    program: String,
    args: Vec<String>,
}

impl CommandAction {
    pub fn new(program: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            args,
        }
    }

    /// 按空白切分命令行，第一个词为程序名
    pub fn parse(command_line: &str) -> Option<Self> {
        let mut parts = command_line.split_whitespace().map(str::to_string);
        let program = parts.next()?;
        Some(Self::new(program, parts.collect()))
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    pub fn args(&self) -> &[String] {
        &self.args
    }
}

impl BlinkAction for CommandAction {
    fn name(&self) -> &'static str {
        "command"
    }

    fn trigger<'a>(&'a self, notice: &'a BlinkNotice) -> BoxFuture<'a, Result<(), ActionError>> {
        Box::pin(async move {
            let status = Command::new(&self.program)
                .args(&self.args)
                .env("BLINK_NUMBER", notice.blink_number.to_string())
                .env("BLINK_SESSION_ID", notice.session_id.to_string())
                .kill_on_drop(true)
                .status()
                .await?;

            if status.success() {
                Ok(())
            } else {
                Err(ActionError::CommandStatus(status.to_string()))
            }
        })
    }
}

/// 以 JSON POST 通知到指定 URL
#[derive(Debug, Clone)]
pub struct WebhookAction {
    url: String,
    client: reqwest::Client,
}

impl WebhookAction {
    pub fn new(url: impl Into<String>, timeout: std::time::Duration) -> Self {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());
        Self {
            url: url.into(),
            client,
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

impl BlinkAction for WebhookAction {
    fn name(&self) -> &'static str {
        "webhook"
    }

    fn trigger<'a>(&'a self, notice: &'a BlinkNotice) -> BoxFuture<'a, Result<(), ActionError>> {
        Box::pin(async move {
            let response = self
                .client
                .post(&self.url)
                .json(notice)
                .send()
                .await
                .map_err(|e| ActionError::Network(e.to_string()))?;

            let status = response.status();
            if status.is_success() {
                Ok(())
            } else {
                Err(ActionError::WebhookStatus(status.as_u16()))
            }
        })
    }
}
