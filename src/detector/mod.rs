//! In-page login detection
//!
//! A [`PageDetector`] lives for one page. It instruments every form that
//! contains a password input with a submit listener, at most once per form
//! identity, and re-runs that scan on every structural change of the document
//! because login forms are often injected after load.
//!
//! On submit it re-checks the password input, builds a `detected` event from
//! the page location and hands it to a [`ReportSink`] without waiting for any
//! reply. Every failure on this path is logged at debug level and dropped: the
//! detector must never disturb the page it runs in, and it keeps no outbox.

pub mod dom;
pub mod page;

use std::collections::HashSet;

use anyhow::Result;

pub use dom::{Document, FormId, InMemoryDocument, InputKind, PageLocation};
pub use page::Page;

use crate::models::{LoginEvent, LoginMethod};
use crate::utils::now_millis;

/// One-way channel from a page to the coordinator
pub trait ReportSink {
    fn report(&self, event: LoginEvent) -> Result<()>;
}

pub struct PageDetector<S> {
    sink: S,
    instrumented: HashSet<FormId>,
}

impl<S: ReportSink> PageDetector<S> {
    pub fn new(sink: S) -> Self {
        Self { sink, instrumented: HashSet::new() }
    }

    /// Attach a submit listener to every password form not yet instrumented
    ///
    /// Safe to call any number of times. Identities are never forgotten, so a
    /// form detached and re-inserted later keeps its single listener. Returns
    /// the number of listeners attached by this call.
    pub fn attach_listeners<D: Document>(&mut self, document: &mut D) -> usize {
        let mut attached = 0;

        for form in document.forms() {
            if self.instrumented.contains(&form) || !document.contains_password_input(form) {
                continue;
            }

            match document.add_submit_listener(form) {
                Ok(()) => {
                    self.instrumented.insert(form);
                    attached += 1;
                }
                Err(e) => log::debug!("Could not instrument form {:?}: {:#}", form, e),
            }
        }

        attached
    }

    /// Mutation-observer callback: the document subtree changed
    pub fn on_mutation<D: Document>(&mut self, document: &mut D) {
        let attached = self.attach_listeners(document);
        if attached > 0 {
            log::debug!("Instrumented {} new password form(s)", attached);
        }
    }

    /// Submit-listener callback; returns whether a report was handed off
    pub fn handle_submit<D: Document>(&self, document: &D, form: FormId) -> bool {
        match self.report_submit(document, form) {
            Ok(reported) => reported,
            Err(e) => {
                log::debug!("Dropped login report for form {:?}: {:#}", form, e);
                false
            }
        }
    }

    fn report_submit<D: Document>(&self, document: &D, form: FormId) -> Result<bool> {
        if !self.instrumented.contains(&form) {
            return Ok(false);
        }

        // The password field may have been removed since the listener was attached
        if !document.contains_password_input(form) {
            return Ok(false);
        }

        let location = document.location()?;
        let event = LoginEvent {
            domain: location.hostname,
            url: location.href,
            timestamp: now_millis(),
            method: LoginMethod::Detected,
        };

        self.sink.report(event)?;
        Ok(true)
    }

    pub fn is_instrumented(&self, form: FormId) -> bool {
        self.instrumented.contains(&form)
    }

    pub fn instrumented_count(&self) -> usize {
        self.instrumented.len()
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;

    use anyhow::bail;

    use super::*;

    #[derive(Default)]
    struct RecordingSink {
        events: RefCell<Vec<LoginEvent>>,
    }

    impl ReportSink for &RecordingSink {
        fn report(&self, event: LoginEvent) -> Result<()> {
            self.events.borrow_mut().push(event);
            Ok(())
        }
    }

    struct BrokenSink;

    impl ReportSink for BrokenSink {
        fn report(&self, _event: LoginEvent) -> Result<()> {
            bail!("coordinator unavailable")
        }
    }

    #[test]
    fn test_attach_only_password_forms() {
        let sink = RecordingSink::default();
        let mut detector = PageDetector::new(&sink);
        let mut doc = InMemoryDocument::new("https://site.test/login");
        let login = doc.add_form(&[InputKind::Email, InputKind::Password]);
        let search = doc.add_form(&[InputKind::Text]);

        assert_eq!(detector.attach_listeners(&mut doc), 1);
        assert!(detector.is_instrumented(login));
        assert!(!detector.is_instrumented(search));
    }

    #[test]
    fn test_attach_is_idempotent() {
        let sink = RecordingSink::default();
        let mut detector = PageDetector::new(&sink);
        let mut doc = InMemoryDocument::new("https://site.test/login");
        let login = doc.add_form(&[InputKind::Password]);

        for _ in 0..10 {
            detector.attach_listeners(&mut doc);
        }

        assert_eq!(doc.listener_count(login), 1);
        assert_eq!(detector.instrumented_count(), 1);
    }

    #[test]
    fn test_form_gaining_password_later_is_instrumented() {
        let sink = RecordingSink::default();
        let mut detector = PageDetector::new(&sink);
        let mut doc = InMemoryDocument::new("https://site.test/");
        let form = doc.add_form(&[InputKind::Email]);

        detector.on_mutation(&mut doc);
        assert!(!detector.is_instrumented(form));

        doc.set_inputs(form, &[InputKind::Email, InputKind::Password]);
        detector.on_mutation(&mut doc);
        assert!(detector.is_instrumented(form));
    }

    #[test]
    fn test_submit_builds_detected_event() {
        let sink = RecordingSink::default();
        let mut detector = PageDetector::new(&sink);
        let mut doc = InMemoryDocument::new("https://site.test/login");
        let form = doc.add_form(&[InputKind::Password]);
        detector.attach_listeners(&mut doc);

        let before = now_millis();
        assert!(detector.handle_submit(&doc, form));

        let events = sink.events.borrow();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].domain, "site.test");
        assert_eq!(events[0].url, "https://site.test/login");
        assert_eq!(events[0].method, LoginMethod::Detected);
        assert!(events[0].timestamp >= before);
    }

    #[test]
    fn test_submit_rechecks_password_input() {
        let sink = RecordingSink::default();
        let mut detector = PageDetector::new(&sink);
        let mut doc = InMemoryDocument::new("https://site.test/login");
        let form = doc.add_form(&[InputKind::Password]);
        detector.attach_listeners(&mut doc);

        doc.set_inputs(form, &[InputKind::Text]);
        assert!(!detector.handle_submit(&doc, form));
        assert!(sink.events.borrow().is_empty());
    }

    #[test]
    fn test_submit_from_uninstrumented_form_is_ignored() {
        let sink = RecordingSink::default();
        let detector = PageDetector::new(&sink);
        let mut doc = InMemoryDocument::new("https://site.test/login");
        let form = doc.add_form(&[InputKind::Password]);

        assert!(!detector.handle_submit(&doc, form));
        assert!(sink.events.borrow().is_empty());
    }

    #[test]
    fn test_errors_are_swallowed() {
        let mut detector = PageDetector::new(BrokenSink);
        let mut doc = InMemoryDocument::new("https://site.test/login");
        let form = doc.add_form(&[InputKind::Password]);
        detector.attach_listeners(&mut doc);

        assert!(!detector.handle_submit(&doc, form));

        // Location without a hostname fails before reaching the sink
        doc.set_href("about:blank");
        assert!(!detector.handle_submit(&doc, form));
    }
}
