use std::path::Path;

use tsrepl_session::{Host, SessionManager};

use crate::error::DispatchError;
use crate::load::{absolute_path, import_statement};

/// Sends units of editor text to the interpreter session.
///
/// Holds nothing but a borrow of the manager; the session is looked up in
/// the registry on every call. Sending never moves focus unless the
/// `_and_focus` variant is used.
pub struct Dispatcher<'m> {
    manager: &'m SessionManager,
}

impl<'m> Dispatcher<'m> {
    pub fn new(manager: &'m SessionManager) -> Self {
        Self { manager }
    }

    /// Write `text` to the session, spawning one if needed.
    ///
    /// Trailing whitespace is dropped and exactly one newline appended, so
    /// the interpreter sees one complete input.
    pub fn send_text(&self, host: &mut dyn Host, text: &str) -> Result<(), DispatchError> {
        let handle = self.manager.ensure_session(host, None, true)?;
        let payload = format!("{}\n", text.trim_end());
        self.manager.write_input(&handle, payload.as_bytes())?;
        Ok(())
    }

    pub fn send_text_and_focus(&self, host: &mut dyn Host, text: &str) -> Result<(), DispatchError> {
        self.send_text(host, text)?;
        self.focus(host)
    }

    /// Send the text between two positions of the current buffer as-is.
    ///
    /// Positions are passed through unchecked; ordering them is the caller's job.
    pub fn send_region(
        &self,
        host: &mut dyn Host,
        start: usize,
        end: usize,
    ) -> Result<(), DispatchError> {
        let text = host.region_text(start, end);
        self.send_text(host, &text)
    }

    pub fn send_region_and_focus(
        &self,
        host: &mut dyn Host,
        start: usize,
        end: usize,
    ) -> Result<(), DispatchError> {
        self.send_region(host, start, end)?;
        self.focus(host)
    }

    /// Send the expression before the cursor, from the start of the line it
    /// begins on up to the cursor.
    pub fn send_last_expression(&self, host: &mut dyn Host) -> Result<(), DispatchError> {
        let (start, end) = last_expression_span(host)?;
        self.send_region(host, start, end)
    }

    pub fn send_last_expression_and_focus(&self, host: &mut dyn Host) -> Result<(), DispatchError> {
        let (start, end) = last_expression_span(host)?;
        self.send_region_and_focus(host, start, end)
    }

    /// Send the whole current buffer.
    pub fn send_buffer(&self, host: &mut dyn Host) -> Result<(), DispatchError> {
        let (start, end) = host.buffer_bounds();
        self.send_region(host, start, end)
    }

    pub fn send_buffer_and_focus(&self, host: &mut dyn Host) -> Result<(), DispatchError> {
        let (start, end) = host.buffer_bounds();
        self.send_region_and_focus(host, start, end)
    }

    /// Import the module at `path` into the session.
    pub fn load_file(&self, host: &mut dyn Host, path: &Path) -> Result<(), DispatchError> {
        let path = absolute_path(path)?;
        let statement = import_statement(&path)?;
        log::debug!("loading {}", path.display());
        self.send_text(host, &statement)
    }

    pub fn load_file_and_focus(&self, host: &mut dyn Host, path: &Path) -> Result<(), DispatchError> {
        self.load_file(host, path)?;
        self.focus(host)
    }

    fn focus(&self, host: &mut dyn Host) -> Result<(), DispatchError> {
        self.manager.switch_to_session(host, true)?;
        Ok(())
    }
}

/// Resolved at call time from the current cursor; never cached.
fn last_expression_span(host: &dyn Host) -> Result<(usize, usize), DispatchError> {
    let point = host.point();
    let start = host
        .backward_expression(point)
        .ok_or(DispatchError::NoExpression)?;
    Ok((host.line_start(start), point))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::io::Read;
    use std::rc::Rc;
    use tsrepl_session::{
        LaunchRequest, Launcher, MemoryHost, Process, SessionConfig, SessionError,
        SessionRegistry,
    };

    struct RecordingProcess {
        written: Rc<RefCell<Vec<u8>>>,
    }

    impl Process for RecordingProcess {
        fn write(&mut self, data: &[u8]) -> Result<(), SessionError> {
            self.written.borrow_mut().extend_from_slice(data);
            Ok(())
        }
        fn is_alive(&mut self) -> bool {
            true
        }
        fn exit_code(&mut self) -> Option<u32> {
            None
        }
        fn take_reader(&mut self) -> Option<Box<dyn Read + Send>> {
            None
        }
        fn pid(&self) -> Option<u32> {
            None
        }
    }

    /// Every process it launches writes into the same byte log.
    #[derive(Clone, Default)]
    struct RecordingLauncher {
        written: Rc<RefCell<Vec<u8>>>,
        launches: Rc<RefCell<usize>>,
    }

    impl Launcher for RecordingLauncher {
        fn launch(&self, _request: &LaunchRequest) -> Result<Box<dyn Process>, SessionError> {
            *self.launches.borrow_mut() += 1;
            Ok(Box::new(RecordingProcess {
                written: Rc::clone(&self.written),
            }))
        }
    }

    fn setup() -> (SessionManager, RecordingLauncher, MemoryHost) {
        let launcher = RecordingLauncher::default();
        let registry = SessionRegistry::shared(SessionConfig::default());
        let manager = SessionManager::new(registry, Box::new(launcher.clone()));
        let mut host = MemoryHost::new();
        host.open_buffer("main.ts", "let a = 1;\nconst f = (x: number) =>\n  x + a;\n");
        (manager, launcher, host)
    }

    fn written(launcher: &RecordingLauncher) -> String {
        String::from_utf8(launcher.written.borrow().clone()).unwrap()
    }

    #[test]
    fn test_send_text_exact_bytes() {
        let (manager, launcher, mut host) = setup();
        let dispatcher = Dispatcher::new(&manager);

        dispatcher.send_text(&mut host, "x+1").unwrap();
        dispatcher.send_text(&mut host, "x+1  \n\t").unwrap();

        assert_eq!(written(&launcher), "x+1\nx+1\n");
        assert_eq!(*launcher.launches.borrow(), 1);
    }

    #[test]
    fn test_send_spawns_without_moving_focus() {
        let (manager, _, mut host) = setup();
        let dispatcher = Dispatcher::new(&manager);
        assert!(manager.current_handle().is_none());

        dispatcher.send_text(&mut host, "1").unwrap();

        assert!(manager.current_handle().is_some());
        assert_eq!(host.current_buffer(), Some("main.ts"));
    }

    #[test]
    fn test_send_region_keeps_embedded_newlines() {
        let (manager, launcher, mut host) = setup();
        let dispatcher = Dispatcher::new(&manager);

        dispatcher.send_region(&mut host, 11, 44).unwrap();

        assert_eq!(written(&launcher), "const f = (x: number) =>\n  x + a;\n");
    }

    #[test]
    fn test_send_region_and_focus() {
        let (manager, launcher, mut host) = setup();
        let dispatcher = Dispatcher::new(&manager);

        dispatcher.send_region_and_focus(&mut host, 0, 10).unwrap();

        assert_eq!(written(&launcher), "let a = 1;\n");
        assert_eq!(host.current_buffer(), Some("*Typescript*"));
        assert_eq!(host.marks().len(), 1);
    }

    #[test]
    fn test_send_last_expression_from_line_start() {
        let (manager, launcher, mut host) = setup();
        let dispatcher = Dispatcher::new(&manager);
        // Cursor right after `1;` on the first line.
        host.set_point(10);

        dispatcher.send_last_expression(&mut host).unwrap();

        assert_eq!(written(&launcher), "let a = 1;\n");
    }

    #[test]
    fn test_send_last_expression_multiline() {
        let (manager, launcher, mut host) = setup();
        let dispatcher = Dispatcher::new(&manager);
        host.open_buffer("obj.ts", "const o = {\n  a: 1,\n}");

        dispatcher.send_last_expression(&mut host).unwrap();

        assert_eq!(written(&launcher), "const o = {\n  a: 1,\n}\n");
    }

    #[test]
    fn test_send_last_expression_uses_current_point() {
        let (manager, launcher, mut host) = setup();
        let dispatcher = Dispatcher::new(&manager);

        host.set_point(10);
        dispatcher.send_last_expression(&mut host).unwrap();
        host.set_point(44);
        dispatcher.send_last_expression(&mut host).unwrap();

        assert_eq!(written(&launcher), "let a = 1;\n  x + a;\n");
    }

    #[test]
    fn test_send_last_expression_and_focus() {
        let (manager, launcher, mut host) = setup();
        let dispatcher = Dispatcher::new(&manager);
        host.set_point(10);

        dispatcher.send_last_expression_and_focus(&mut host).unwrap();

        assert_eq!(written(&launcher), "let a = 1;\n");
        assert_eq!(host.current_buffer(), Some("*Typescript*"));
    }

    #[test]
    fn test_no_expression_sends_nothing() {
        let (manager, launcher, mut host) = setup();
        let dispatcher = Dispatcher::new(&manager);
        host.open_buffer("empty.ts", "  \n");

        let result = dispatcher.send_last_expression(&mut host);

        assert!(matches!(result, Err(DispatchError::NoExpression)));
        assert!(written(&launcher).is_empty());
        assert!(manager.current_handle().is_none());
    }

    #[test]
    fn test_send_buffer() {
        let (manager, launcher, mut host) = setup();
        let dispatcher = Dispatcher::new(&manager);

        dispatcher.send_buffer(&mut host).unwrap();

        assert_eq!(
            written(&launcher),
            "let a = 1;\nconst f = (x: number) =>\n  x + a;\n"
        );
        assert_eq!(host.current_buffer(), Some("main.ts"));
    }

    #[test]
    fn test_send_buffer_and_focus() {
        let (manager, _, mut host) = setup();
        let dispatcher = Dispatcher::new(&manager);

        dispatcher.send_buffer_and_focus(&mut host).unwrap();

        assert_eq!(host.current_buffer(), Some("*Typescript*"));
    }

    #[test]
    fn test_load_file_statement() {
        let (manager, launcher, mut host) = setup();
        let dispatcher = Dispatcher::new(&manager);

        dispatcher.load_file(&mut host, Path::new("/a/b/foo.ts")).unwrap();

        assert_eq!(written(&launcher), "import * as foo from \"foo\"\n");
        assert_eq!(host.current_buffer(), Some("main.ts"));
    }

    #[test]
    fn test_load_relative_file_and_focus() {
        let (manager, launcher, mut host) = setup();
        let dispatcher = Dispatcher::new(&manager);

        dispatcher
            .load_file_and_focus(&mut host, Path::new("src/util.ts"))
            .unwrap();

        assert_eq!(written(&launcher), "import * as util from \"util\"\n");
        assert_eq!(host.current_buffer(), Some("*Typescript*"));
    }

    #[test]
    fn test_load_invalid_file_name() {
        let (manager, launcher, mut host) = setup();
        let dispatcher = Dispatcher::new(&manager);

        let result = dispatcher.load_file(&mut host, Path::new("/"));

        assert!(matches!(result, Err(DispatchError::InvalidFileName(_))));
        assert!(written(&launcher).is_empty());
    }

    #[test]
    fn test_send_text_and_focus() {
        let (manager, launcher, mut host) = setup();
        let dispatcher = Dispatcher::new(&manager);

        dispatcher.send_text_and_focus(&mut host, "a").unwrap();

        assert_eq!(written(&launcher), "a\n");
        assert_eq!(host.current_buffer(), Some("*Typescript*"));
    }

    #[test]
    fn test_focus_fails_when_session_buffer_killed() {
        let (manager, _, mut host) = setup();
        let dispatcher = Dispatcher::new(&manager);
        dispatcher.send_text(&mut host, "1").unwrap();
        host.kill_buffer("*Typescript*");
        host.focus_buffer("main.ts");

        // The live session is reused, but its buffer is gone.
        let result = dispatcher.send_text_and_focus(&mut host, "2");
        assert!(matches!(
            result,
            Err(DispatchError::Session(SessionError::NoSession))
        ));
    }
}
