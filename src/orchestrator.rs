//! One complete run: call, record, analyze, report

use chrono::{Local, Utc};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{error, info, warn};

use crate::analysis::{AnalysisOutcome, InferenceProvider, RemoteAnalysisClient, NOT_AVAILABLE};
use crate::audio::RecordingInfo;
use crate::config::Config;
use crate::error::{HotlineError, Result};
use crate::notify::{Notification, NotificationSink, Priority};
use crate::result_log::ResultLog;
use crate::telephony::{CallSession, CallStatus, TelephonyProvider, RECORD_ON_ANSWER_TWIML};

/// What happened during a run
#[derive(Debug, Default)]
pub struct RunReport {
    pub call_id: Option<String>,
    pub final_status: Option<CallStatus>,
    pub recording_id: Option<String>,
    pub recording_path: Option<PathBuf>,
    pub outcome: Option<AnalysisOutcome>,
    /// Fault that stopped the run early
    pub fault: Option<HotlineError>,
    /// Whether the remote recording was deleted
    pub recording_deleted: bool,
}

impl RunReport {
    /// A run succeeds when it reaches a structured analysis result
    pub fn succeeded(&self) -> bool {
        self.fault.is_none() && self.outcome.as_ref().is_some_and(AnalysisOutcome::is_success)
    }
}

/// Sequences the call session, the analysis and the reporting sinks
pub struct Orchestrator<'a> {
    config: &'a Config,
    telephony: Arc<dyn TelephonyProvider>,
    inference: Arc<dyn InferenceProvider>,
    notifier: Arc<dyn NotificationSink>,
    result_log: ResultLog,
}

impl<'a> Orchestrator<'a> {
    pub fn new(
        config: &'a Config,
        telephony: Arc<dyn TelephonyProvider>,
        inference: Arc<dyn InferenceProvider>,
        notifier: Arc<dyn NotificationSink>,
    ) -> Self {
        Self {
            config,
            telephony,
            inference,
            notifier,
            result_log: ResultLog::new(&config.log_file),
        }
    }

    /// Execute one run. Faults are logged and notified here; the report
    /// carries them back for the exit status.
    pub async fn run(&self) -> RunReport {
        info!("Run started at {}", Local::now().to_rfc3339());

        let mut report = RunReport::default();
        let mut session = CallSession::new(Arc::clone(&self.telephony), self.config.call);

        if let Err(fault) = self.run_stages(&mut session, &mut report).await {
            self.report_fault(&fault, session.call_id()).await;
            report.fault = Some(fault);
        }

        // The recording is released last, whatever happened above
        if session.recording().is_some() {
            report.recording_deleted = session.delete_remote_recording().await;
        } else if let Some(call_id) = session.call_id() {
            info!("No recording obtained for call {}, skipping deletion", call_id);
        }

        report.call_id = session.call_id().map(str::to_owned);
        report.recording_id = session.recording().map(|r| r.recording_id.clone());

        info!("Run finished at {}", Local::now().to_rfc3339());
        report
    }

    async fn run_stages(&self, session: &mut CallSession, report: &mut RunReport) -> Result<()> {
        self.config.ensure_directories()?;

        let call_id = session
            .place(
                &self.config.twilio.phone_number,
                &self.config.hotline_phone_number,
                RECORD_ON_ANSWER_TWIML,
            )
            .await?;

        let status = session.await_completion().await?;
        report.final_status = Some(status);
        if status != CallStatus::Completed {
            return Err(HotlineError::CallEnded { call_id, status });
        }

        session.locate_recording().await?;

        let path = session
            .download_recording(&self.config.recordings_dir)
            .await
            .inspect_err(|_| warn!("Skipping analysis because the recording download failed"))?;
        report.recording_path = Some(path.clone());

        match RecordingInfo::probe(&path) {
            Ok(info) if info.is_empty() => warn!("Recording {} contains no audio", path.display()),
            Ok(_) => {}
            Err(e) => warn!("Could not read recording header: {:#}", e),
        }

        let client = RemoteAnalysisClient::new(Arc::clone(&self.inference), self.config.analysis.clone());
        let outcome = client.analyze_file(&path).await;
        info!("Analysis result - Color: {}, Date: {}", outcome.color(), outcome.date());

        self.publish_outcome(&outcome).await;
        report.outcome = Some(outcome);
        Ok(())
    }

    async fn publish_outcome(&self, outcome: &AnalysisOutcome) {
        self.result_log.append(outcome.color(), outcome.summary());

        let title = result_title(outcome.color(), outcome.date());
        let message = format!("Summary: {}", outcome.summary());
        let ntfy = &self.config.ntfy;

        self.notifier
            .send(&Notification {
                topic: ntfy.topic_logs.clone(),
                title: title.clone(),
                message: message.clone(),
                priority: Priority::LOG,
            })
            .await;

        if self.config.target_color.as_deref() == Some(outcome.color()) {
            info!("Target color '{}' found, sending alert", outcome.color());
            self.notifier
                .send(&Notification {
                    topic: ntfy.topic_alerts.clone(),
                    title,
                    message,
                    priority: Priority::URGENT,
                })
                .await;
        }
    }

    async fn report_fault(&self, fault: &HotlineError, call_id: Option<&str>) {
        let timestamp = Local::now().format("%Y-%m-%d %H:%M:%S");
        let message = match fault {
            HotlineError::Timeout { .. } => format!(
                "Call polling timed out for call {}.\nTimestamp: {}",
                call_id.unwrap_or(NOT_AVAILABLE),
                timestamp
            ),
            _ => format!("{}\nTimestamp: {}", fault, timestamp),
        };
        error!("[{}] {}", fault.log_label(), message);

        self.result_log.append_at(Utc::now(), fault.log_label(), &fault.to_string());

        self.notifier
            .send(&Notification {
                topic: self.config.ntfy.topic_errors.clone(),
                title: fault.notification_title().to_string(),
                message,
                priority: Priority::URGENT,
            })
            .await;
    }
}

/// Notification title for a result, e.g. `Blue, Wednesday, April 23rd`
pub fn result_title(color: &str, date: &str) -> String {
    let date = if date == NOT_AVAILABLE { "Date Unknown" } else { date };
    format!("{}, {}", capitalize(color), date)
}

fn capitalize(text: &str) -> String {
    let mut chars = text.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect(),
        None => String::new(),
    }
}
