#[cfg(test)]
pub mod fixtures {
    use crate::delivery::{DeliveryError, DeliveryOutcome, DeliveryRequest, ResultDelivery};
    use crate::error::{Result, ScanError};
    use crate::platform::{
        CodeArtifact, Project, ScanHandle, ScanPlatform, ScanState, ScanStatus, ScanSummary,
    };
    use async_trait::async_trait;
    use std::path::Path;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    /// Build a SARIF log whose first run has `results` entries.
    pub fn sarif_with_results(results: usize, tool_name: Option<&str>) -> String {
        let entries = (0..results)
            .map(|i| {
                format!(
                    r#"{{"ruleId":"rule-{}","message":{{"text":"finding {}"}}}}"#,
                    i % 7,
                    i
                )
            })
            .collect::<Vec<_>>()
            .join(",");
        let driver = match tool_name {
            Some(name) => format!(r#"{{"name":"{name}","version":"2.0.0"}}"#),
            None => r#"{"version":"2.0.0"}"#.to_string(),
        };
        format!(
            r#"{{"version":"2.1.0","$schema":"https://raw.githubusercontent.com/oasis-tcs/sarif-spec/master/Schemata/sarif-schema-2.1.0.json","runs":[{{"tool":{{"driver":{driver}}},"artifacts":[],"results":[{entries}]}}]}}"#
        )
    }

    pub fn sarif_without_tool_name(results: usize) -> String {
        sarif_with_results(results, None)
    }

    pub fn scan_handle() -> ScanHandle {
        ScanHandle {
            organization_id: "org-1".to_string(),
            project_id: "project-1".to_string(),
            scan_id: "scan-1".to_string(),
            label: "refs/heads/main-abc123".to_string(),
            status_endpoint: "https://contrast.example/api/sast/organizations/org-1/projects/project-1/scans/scan-1".to_string(),
        }
    }

    pub fn project(archived: bool) -> Project {
        Project {
            id: "project-1".to_string(),
            name: "octo/webgoat".to_string(),
            archived,
            language: Some("JAVA".to_string()),
        }
    }

    fn api_error(endpoint: &str, status: u16) -> ScanError {
        ScanError::PlatformApi {
            endpoint: endpoint.to_string(),
            status,
            body: "scripted failure".to_string(),
        }
    }

    /// Scripted in-memory scan platform.
    ///
    /// Status queries walk through `statuses` and then repeat the last one.
    pub struct FakePlatform {
        existing_project: Option<Project>,
        statuses: Vec<ScanStatus>,
        error_message: Option<String>,
        sarif: Vec<u8>,
        summary: ScanSummary,
        sarif_delay: Option<Duration>,
        status_failure: Option<u16>,
        summary_failure: Option<u16>,
        panic_on_summary: bool,
        status_calls: AtomicUsize,
        sarif_calls: AtomicUsize,
        summary_calls: AtomicUsize,
        created: Mutex<Vec<(String, String)>>,
        uploads: AtomicUsize,
        scans_started: Mutex<Vec<String>>,
    }

    impl Default for FakePlatform {
        fn default() -> Self {
            Self::new()
        }
    }

    impl FakePlatform {
        pub fn new() -> Self {
            Self {
                existing_project: None,
                statuses: vec![ScanStatus::Completed],
                error_message: None,
                sarif: sarif_with_results(0, Some("Contrast Scan")).into_bytes(),
                summary: ScanSummary {
                    total_results: 4,
                    total_new_results: 2,
                    total_fixed_results: 1,
                },
                sarif_delay: None,
                status_failure: None,
                summary_failure: None,
                panic_on_summary: false,
                status_calls: AtomicUsize::new(0),
                sarif_calls: AtomicUsize::new(0),
                summary_calls: AtomicUsize::new(0),
                created: Mutex::new(Vec::new()),
                uploads: AtomicUsize::new(0),
                scans_started: Mutex::new(Vec::new()),
            }
        }

        pub fn with_existing_project(mut self, project: Project) -> Self {
            self.existing_project = Some(project);
            self
        }

        pub fn with_statuses(mut self, statuses: &[ScanStatus]) -> Self {
            self.statuses = statuses.to_vec();
            self
        }

        pub fn with_error_message(mut self, message: &str) -> Self {
            self.error_message = Some(message.to_string());
            self
        }

        pub fn with_sarif(mut self, sarif: &[u8]) -> Self {
            self.sarif = sarif.to_vec();
            self
        }

        pub fn with_sarif_delay(mut self, delay: Duration) -> Self {
            self.sarif_delay = Some(delay);
            self
        }

        pub fn failing_status(mut self, status: u16) -> Self {
            self.status_failure = Some(status);
            self
        }

        pub fn failing_summary(mut self, status: u16) -> Self {
            self.summary_failure = Some(status);
            self
        }

        pub fn panicking_summary(mut self) -> Self {
            self.panic_on_summary = true;
            self
        }

        pub fn status_calls(&self) -> usize {
            self.status_calls.load(Ordering::SeqCst)
        }

        pub fn sarif_calls(&self) -> usize {
            self.sarif_calls.load(Ordering::SeqCst)
        }

        pub fn summary_calls(&self) -> usize {
            self.summary_calls.load(Ordering::SeqCst)
        }

        pub fn upload_calls(&self) -> usize {
            self.uploads.load(Ordering::SeqCst)
        }

        /// `(name, language)` of every project created.
        pub fn created_projects(&self) -> Vec<(String, String)> {
            self.created.lock().unwrap().clone()
        }

        /// Labels of every scan started.
        pub fn started_scans(&self) -> Vec<String> {
            self.scans_started.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl ScanPlatform for FakePlatform {
        async fn find_project(&self, name: &str) -> Result<Option<Project>> {
            Ok(self
                .existing_project
                .clone()
                .filter(|p| p.name == name))
        }

        async fn create_project(&self, name: &str, language: &str) -> Result<Project> {
            self.created
                .lock()
                .unwrap()
                .push((name.to_string(), language.to_string()));
            Ok(Project {
                id: "project-new".to_string(),
                name: name.to_string(),
                archived: false,
                language: Some(language.to_string()),
            })
        }

        async fn upload_code_artifact(
            &self,
            _project: &Project,
            artifact: &Path,
            _prescan: Option<&Path>,
        ) -> Result<CodeArtifact> {
            self.uploads.fetch_add(1, Ordering::SeqCst);
            Ok(CodeArtifact {
                id: "artifact-1".to_string(),
                filename: artifact
                    .file_name()
                    .map(|n| n.to_string_lossy().into_owned()),
            })
        }

        async fn start_scan(
            &self,
            project: &Project,
            _artifact: &CodeArtifact,
            label: &str,
        ) -> Result<ScanHandle> {
            self.scans_started.lock().unwrap().push(label.to_string());
            Ok(ScanHandle {
                project_id: project.id.clone(),
                label: label.to_string(),
                ..scan_handle()
            })
        }

        async fn scan_state(&self, handle: &ScanHandle) -> Result<ScanState> {
            let call = self.status_calls.fetch_add(1, Ordering::SeqCst);
            if let Some(status) = self.status_failure {
                return Err(api_error(&handle.status_endpoint, status));
            }
            let index = call.min(self.statuses.len().saturating_sub(1));
            let status = self
                .statuses
                .get(index)
                .copied()
                .unwrap_or(ScanStatus::Running);
            Ok(ScanState {
                status,
                error_message: status
                    .is_failure()
                    .then(|| self.error_message.clone())
                    .flatten(),
            })
        }

        async fn fetch_sarif(&self, handle: &ScanHandle) -> Result<Vec<u8>> {
            self.sarif_calls.fetch_add(1, Ordering::SeqCst);
            if let Some(delay) = self.sarif_delay {
                tokio::time::sleep(delay).await;
            }
            let _ = handle;
            Ok(self.sarif.clone())
        }

        async fn scan_summary(&self, handle: &ScanHandle) -> Result<ScanSummary> {
            self.summary_calls.fetch_add(1, Ordering::SeqCst);
            if self.panic_on_summary {
                panic!("summary exploded");
            }
            if let Some(status) = self.summary_failure {
                return Err(api_error(&format!("{}/summary", handle.status_endpoint), status));
            }
            Ok(self.summary)
        }
    }

    /// Delivery target that records requests and answers with a fixed status.
    pub struct RecordingDelivery {
        status: u16,
        requests: Mutex<Vec<DeliveryRequest>>,
    }

    impl RecordingDelivery {
        pub fn accepting() -> Self {
            Self::answering(202)
        }

        pub fn answering(status: u16) -> Self {
            Self {
                status,
                requests: Mutex::new(Vec::new()),
            }
        }

        pub fn requests(&self) -> Vec<DeliveryRequest> {
            self.requests.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl ResultDelivery for RecordingDelivery {
        async fn deliver(&self, request: &DeliveryRequest) -> DeliveryOutcome {
            self.requests.lock().unwrap().push(request.clone());
            if self.status == 202 {
                DeliveryOutcome::Accepted(r#"{"id":"analysis-1"}"#.to_string())
            } else {
                DeliveryOutcome::Failed(DeliveryError::Status {
                    status: self.status,
                    body: "rejected".to_string(),
                })
            }
        }
    }
}
