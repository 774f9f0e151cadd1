use std::io::{BufRead, Write};
use std::mem;

use gitdag_types::GitOid;
use tracing::debug;

use crate::command::Command;
use crate::config::RemoteConfig;
use crate::error::{RemoteError, RemoteResult};
use crate::handler::RemoteHandler;

/// One queued transfer, run when the client flushes the batch.
enum DeferredTask {
    Push { src: String, dst: String },
    Fetch { oid: GitOid, ref_name: String },
}

/// Drives one protocol run over a line stream.
///
/// Capability and list commands are answered immediately; push and fetch
/// commands are queued and run in arrival order when the client sends the
/// blank flush line. Protocol output and log output never share a stream:
/// everything written here goes to `output`, all diagnostics go through
/// `tracing`.
pub struct Dispatcher<H> {
    handler: H,
    config: RemoteConfig,
    tasks: Vec<DeferredTask>,
}

impl<H: RemoteHandler> Dispatcher<H> {
    pub fn new(handler: H, config: RemoteConfig) -> Self {
        Self {
            handler,
            config,
            tasks: Vec::new(),
        }
    }

    /// Give the handler back, usually to read the final root after a run.
    pub fn into_handler(self) -> H {
        self.handler
    }

    /// Process one batch of commands from `input`, writing protocol
    /// responses to `output`. Returns when the batch is flushed or the
    /// stream ends; any later batch needs a fresh run.
    pub fn run(&mut self, mut input: impl BufRead, mut output: impl Write) -> RemoteResult<()> {
        self.handler.initialize()?;

        let mut line = String::new();
        loop {
            line.clear();
            if input.read_line(&mut line)? == 0 {
                // Stream closed without a flush line. Run whatever is
                // queued, but skip the terminating blank line: nobody is
                // reading it anymore.
                debug!("input stream closed");
                self.drain(&mut output)?;
                break;
            }

            debug!(command = line.trim_end_matches(['\n', '\r']), "client command");
            match Command::parse(&line)? {
                Command::Capabilities => {
                    for capability in self.handler.capabilities() {
                        writeln!(output, "{capability}")?;
                    }
                    writeln!(output)?;
                    output.flush()?;
                }
                Command::List { for_push } => match self.handler.list(for_push) {
                    Ok(entries) => {
                        for entry in entries {
                            writeln!(output, "{entry}")?;
                        }
                        writeln!(output)?;
                        output.flush()?;
                    }
                    Err(e) => {
                        if self.config.announce_list_failures {
                            writeln!(output, "error: {e}")?;
                            output.flush()?;
                        }
                        return Err(e);
                    }
                },
                Command::Push { src, dst } => {
                    self.tasks.push(DeferredTask::Push { src, dst });
                }
                Command::Fetch { oid, ref_name } => {
                    self.tasks.push(DeferredTask::Fetch { oid, ref_name });
                }
                Command::EndOfBatch => {
                    self.drain(&mut output)?;
                    writeln!(output)?;
                    output.flush()?;
                    break;
                }
                Command::Unknown(command) => {
                    return Err(RemoteError::UnknownCommand(command));
                }
            }
        }

        self.handler.finish()
    }

    fn drain(&mut self, mut output: impl Write) -> RemoteResult<()> {
        for task in mem::take(&mut self.tasks) {
            match task {
                DeferredTask::Push { src, dst } => {
                    let done = self.handler.push(&src, &dst)?;
                    writeln!(output, "ok {done}")?;
                }
                DeferredTask::Fetch { oid, ref_name } => {
                    if oid.is_zero() {
                        debug!(ref_name = ref_name.as_str(), "skipping fetch of the zero id");
                        continue;
                    }
                    self.handler.fetch(&oid, &ref_name)?;
                }
            }
        }
        output.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::RefEntry;

    const SHA: &str = "26788196417edb6cc5d87d24a7c3be93ea79cf19";

    #[derive(Default)]
    struct FakeHandler {
        refs: Vec<RefEntry>,
        fail_init: bool,
        fail_list: bool,
        ops: Vec<String>,
        finished: bool,
    }

    impl RemoteHandler for FakeHandler {
        fn initialize(&mut self) -> RemoteResult<()> {
            self.ops.push("initialize".to_string());
            if self.fail_init {
                return Err(RemoteError::Repo("no repository".to_string()));
            }
            Ok(())
        }

        fn list(&mut self, for_push: bool) -> RemoteResult<Vec<RefEntry>> {
            self.ops.push(format!("list for_push={for_push}"));
            if self.fail_list {
                return Err(RemoteError::Engine("refs unavailable".to_string()));
            }
            Ok(self.refs.clone())
        }

        fn push(&mut self, src: &str, dst: &str) -> RemoteResult<String> {
            self.ops.push(format!("push {src}:{dst}"));
            Ok(dst.to_string())
        }

        fn fetch(&mut self, oid: &GitOid, ref_name: &str) -> RemoteResult<()> {
            self.ops.push(format!("fetch {oid} {ref_name}"));
            Ok(())
        }

        fn finish(&mut self) -> RemoteResult<()> {
            self.finished = true;
            Ok(())
        }
    }

    fn run(handler: FakeHandler, input: &str) -> (RemoteResult<()>, String, FakeHandler) {
        run_with(handler, RemoteConfig::default(), input)
    }

    fn run_with(
        handler: FakeHandler,
        config: RemoteConfig,
        input: &str,
    ) -> (RemoteResult<()>, String, FakeHandler) {
        let mut dispatcher = Dispatcher::new(handler, config);
        let mut out = Vec::new();
        let result = dispatcher.run(input.as_bytes(), &mut out);
        let rendered = String::from_utf8(out).expect("protocol output is utf-8");
        (result, rendered, dispatcher.into_handler())
    }

    // -----------------------------------------------------------------------
    // Stream framing
    // -----------------------------------------------------------------------

    #[test]
    fn capabilities_then_eof_prints_exactly_the_capability_block() {
        let (result, out, handler) = run(FakeHandler::default(), "capabilities\n");
        result.unwrap();
        assert_eq!(out, "list\npush\nfetch\n\n");
        assert!(handler.finished);
    }

    #[test]
    fn a_lone_blank_line_ends_the_batch() {
        let (result, out, handler) = run(FakeHandler::default(), "\n");
        result.unwrap();
        assert_eq!(out, "\n");
        assert!(handler.finished);
    }

    #[test]
    fn empty_input_produces_no_output() {
        let (result, out, handler) = run(FakeHandler::default(), "");
        result.unwrap();
        assert_eq!(out, "");
        assert!(handler.finished);
    }

    #[test]
    fn the_run_ends_at_the_first_flush() {
        let (result, out, handler) = run(FakeHandler::default(), "push a:b\n\nlist\n");
        result.unwrap();
        assert_eq!(out, "ok b\n\n");
        assert!(!handler.ops.iter().any(|op| op.starts_with("list")));
    }

    // -----------------------------------------------------------------------
    // Listing
    // -----------------------------------------------------------------------

    #[test]
    fn list_renders_entries_then_a_blank_line() {
        let handler = FakeHandler {
            refs: vec![RefEntry::pointer("HEAD", "@refs/heads/master")],
            ..FakeHandler::default()
        };
        let (result, out, handler) = run(handler, "list\n");
        result.unwrap();
        assert_eq!(out, "@refs/heads/master HEAD\n\n");
        assert_eq!(handler.ops, ["initialize", "list for_push=false"]);
    }

    #[test]
    fn an_empty_listing_is_just_the_blank_line() {
        let (result, out, _) = run(FakeHandler::default(), "list\n");
        result.unwrap();
        assert_eq!(out, "\n");
    }

    #[test]
    fn list_for_push_is_passed_through() {
        let (result, _, handler) = run(FakeHandler::default(), "list for-push\n");
        result.unwrap();
        assert_eq!(handler.ops, ["initialize", "list for_push=true"]);
    }

    #[test]
    fn a_failing_list_aborts_quietly_by_default() {
        let handler = FakeHandler {
            fail_list: true,
            ..FakeHandler::default()
        };
        let (result, out, handler) = run(handler, "list\n");
        assert!(matches!(result, Err(RemoteError::Engine(_))));
        assert_eq!(out, "");
        assert!(!handler.finished);
    }

    #[test]
    fn a_failing_list_announces_when_configured() {
        let handler = FakeHandler {
            fail_list: true,
            ..FakeHandler::default()
        };
        let config = RemoteConfig {
            announce_list_failures: true,
            ..RemoteConfig::default()
        };
        let (result, out, _) = run_with(handler, config, "list\n");
        assert!(result.is_err());
        assert_eq!(out, "error: transfer engine error: refs unavailable\n");
    }

    // -----------------------------------------------------------------------
    // Batching
    // -----------------------------------------------------------------------

    #[test]
    fn transfers_wait_for_the_flush_line() {
        let input = format!("push refs/heads/a:refs/heads/b\nfetch {SHA} refs/heads/b\nlist\n\n");
        let (result, out, handler) = run(FakeHandler::default(), &input);
        result.unwrap();

        // The list answered first even though it arrived last.
        let expected = vec![
            "initialize".to_string(),
            "list for_push=false".to_string(),
            "push refs/heads/a:refs/heads/b".to_string(),
            format!("fetch {SHA} refs/heads/b"),
        ];
        assert_eq!(handler.ops, expected);
        assert_eq!(out, "\nok refs/heads/b\n\n");
        assert!(handler.finished);
    }

    #[test]
    fn a_closed_stream_still_drains_queued_work() {
        let (result, out, handler) = run(FakeHandler::default(), "push a:b\n");
        result.unwrap();
        assert_eq!(out, "ok b\n");
        assert!(handler.finished);
    }

    #[test]
    fn zero_id_fetches_are_skipped() {
        let zeros = "0".repeat(40);
        let (result, out, handler) =
            run(FakeHandler::default(), &format!("fetch {zeros} refs/heads/x\n\n"));
        result.unwrap();
        assert_eq!(out, "\n");
        assert!(!handler.ops.iter().any(|op| op.starts_with("fetch")));
    }

    #[test]
    fn force_markers_are_dropped() {
        let (result, out, handler) =
            run(FakeHandler::default(), "push +refs/heads/a:refs/heads/b\n\n");
        result.unwrap();
        assert!(handler.ops.contains(&"push refs/heads/a:refs/heads/b".to_string()));
        assert_eq!(out, "ok refs/heads/b\n\n");
    }

    // -----------------------------------------------------------------------
    // Failure handling
    // -----------------------------------------------------------------------

    #[test]
    fn unknown_commands_are_fatal() {
        let (result, out, handler) = run(FakeHandler::default(), "listing\n");
        assert!(matches!(result, Err(RemoteError::UnknownCommand(c)) if c == "listing"));
        assert_eq!(out, "");
        assert!(!handler.finished);
    }

    #[test]
    fn malformed_push_arguments_are_fatal() {
        let (result, _, handler) = run(FakeHandler::default(), "push nocolon\n\n");
        assert!(matches!(result, Err(RemoteError::MalformedCommand { .. })));
        assert!(!handler.finished);
    }

    #[test]
    fn initialization_failure_stops_the_run() {
        let handler = FakeHandler {
            fail_init: true,
            ..FakeHandler::default()
        };
        let (result, out, handler) = run(handler, "capabilities\n");
        assert!(matches!(result, Err(RemoteError::Repo(_))));
        assert_eq!(out, "");
        assert_eq!(handler.ops, ["initialize"]);
    }
}
