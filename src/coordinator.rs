//! Navigation coordinator
//!
//! Runs property resolution once per completed navigation and forwards the
//! report to the analytics sink. Two states:
//!
//! ```text
//! Idle --navigate_and_report--> Pending(override)
//! Pending --location change--> Idle   (report uses the override)
//! Idle --location change--> Idle      (back/forward, links, initial mount)
//! ```
//!
//! The override slot holds one value. A second `navigate_and_report` before
//! the location change replaces the first.

use std::cell::RefCell;
use std::rc::{Rc, Weak};

use crate::capture::CaptureConfig;
use crate::dom::{DomReader, Location};
use crate::engine::{NavigationOverride, PageReport, PropertyEngine};
use crate::error::{Error, Result};
use crate::properties::PropertyMap;

pub type SinkResult = std::result::Result<(), Box<dyn std::error::Error>>;

/// Router capability: performs a client-side navigation.
pub trait Navigator {
    fn navigate(&self, path: &str);
}

/// Receives one flat property map per reported page.
pub trait AnalyticsSink {
    fn report_page(&self, properties: &PropertyMap) -> SinkResult;
}

#[derive(Debug, Clone, PartialEq, Default)]
pub enum NavigationState {
    #[default]
    Idle,
    Pending(NavigationOverride),
}

struct Shared {
    config: RefCell<CaptureConfig>,
    state: RefCell<NavigationState>,
    dom: Rc<dyn DomReader>,
    navigator: Rc<dyn Navigator>,
    sink: Rc<dyn AnalyticsSink>,
}

impl Shared {
    fn take_override(&self) -> Option<NavigationOverride> {
        match self.state.replace(NavigationState::Idle) {
            NavigationState::Pending(nav_override) => Some(nav_override),
            NavigationState::Idle => None,
        }
    }
}

/// Owns the override slot for one mounted scope. Dropping it unmounts the
/// scope and detaches every `NavigateHandle`.
pub struct NavigationCoordinator {
    shared: Rc<Shared>,
}

impl NavigationCoordinator {
    /// Mount the coordinator and report the initial location.
    pub fn mount(
        config: CaptureConfig,
        dom: Rc<dyn DomReader>,
        navigator: Rc<dyn Navigator>,
        sink: Rc<dyn AnalyticsSink>,
    ) -> Self {
        let coordinator = Self {
            shared: Rc::new(Shared {
                config: RefCell::new(config),
                state: RefCell::new(NavigationState::Idle),
                dom,
                navigator,
                sink,
            }),
        };
        coordinator.on_location_change();
        coordinator
    }

    pub fn handle(&self) -> NavigateHandle {
        NavigateHandle {
            shared: Rc::downgrade(&self.shared),
        }
    }

    /// Swap the capture configuration wholesale.
    pub fn replace_config(&self, config: CaptureConfig) {
        *self.shared.config.borrow_mut() = config;
    }

    pub fn state(&self) -> NavigationState {
        self.shared.state.borrow().clone()
    }

    /// Handle a completed navigation.
    ///
    /// Consumes a pending override if there is one. Returns the report that
    /// was sent, or `None` when the page was suppressed or resolution failed.
    /// Never returns an error: failures are logged and the report dropped.
    pub fn on_location_change(&self) -> Option<PageReport> {
        let shared = &self.shared;
        let nav_override = shared.take_override();
        let location = shared.dom.location();

        if let Some(o) = &nav_override {
            let target = Location::from_relative(&o.target_path);
            if target.path != location.path {
                tracing::debug!(
                    "Override for {} applied to location {}",
                    o.target_path,
                    location.path
                );
            }
        }

        let resolved = {
            let config = shared.config.borrow();
            PropertyEngine::new(&config, shared.dom.as_ref()).resolve(&location, nav_override.as_ref())
        };

        let report = match resolved {
            Ok(report) => report,
            Err(e) => {
                tracing::error!("Dropping page report for {}: {}", location.path, e);
                return None;
            }
        };

        if report.is_empty() {
            tracing::debug!("Page report for {} suppressed", location.path);
            return None;
        }

        if let Err(e) = shared.sink.report_page(&report.properties) {
            tracing::warn!("Analytics sink failed for {}: {}", location.path, e);
        }

        Some(report)
    }
}

/// Caller-side entry point for "navigate and report". Only usable while the
/// coordinator it came from is mounted.
#[derive(Clone, Default)]
pub struct NavigateHandle {
    shared: Weak<Shared>,
}

impl NavigateHandle {
    /// A handle not attached to any coordinator.
    pub fn detached() -> Self {
        Self::default()
    }

    /// Store the override, then ask the router to navigate to `path`.
    ///
    /// The report is sent when the resulting location change arrives.
    pub fn navigate_and_report(
        &self,
        path: &str,
        page_name: Option<&str>,
        properties: Option<PropertyMap>,
    ) -> Result<()> {
        let shared = self.shared.upgrade().ok_or(Error::MissingContext)?;

        let previous = shared.state.replace(NavigationState::Pending(NavigationOverride {
            target_path: path.to_string(),
            page_name: page_name.map(String::from),
            properties,
        }));
        if let NavigationState::Pending(previous) = previous {
            tracing::warn!(
                "Override for {} replaced by navigation to {} before it was reported",
                previous.target_path,
                path
            );
        }

        shared.navigator.navigate(path);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capture::{CaptureRules, CaptureSet, CaptureSource};
    use crate::dom::MetaElement;
    use crate::engine::PAGE_NAME_KEY;

    struct FakeDom {
        location: RefCell<Location>,
        blocks: RefCell<Vec<String>>,
    }

    impl FakeDom {
        fn at(href: &str) -> Rc<Self> {
            Rc::new(Self {
                location: RefCell::new(Location::from_relative(href)),
                blocks: RefCell::new(Vec::new()),
            })
        }

        fn go(&self, href: &str) {
            *self.location.borrow_mut() = Location::from_relative(href);
        }
    }

    impl DomReader for FakeDom {
        fn meta_elements(&self) -> Vec<MetaElement> {
            Vec::new()
        }

        fn structured_data_blocks(&self) -> Vec<String> {
            self.blocks.borrow().clone()
        }

        fn title(&self) -> String {
            "Title".to_string()
        }

        fn location(&self) -> Location {
            self.location.borrow().clone()
        }
    }

    #[derive(Default)]
    struct RecordingNavigator {
        requested: RefCell<Vec<String>>,
    }

    impl Navigator for RecordingNavigator {
        fn navigate(&self, path: &str) {
            self.requested.borrow_mut().push(path.to_string());
        }
    }

    #[derive(Default)]
    struct RecordingSink {
        reports: RefCell<Vec<PropertyMap>>,
        fail: bool,
    }

    impl AnalyticsSink for RecordingSink {
        fn report_page(&self, properties: &PropertyMap) -> SinkResult {
            self.reports.borrow_mut().push(properties.clone());
            if self.fail {
                return Err("collector offline".into());
            }
            Ok(())
        }
    }

    struct Harness {
        dom: Rc<FakeDom>,
        navigator: Rc<RecordingNavigator>,
        sink: Rc<RecordingSink>,
        coordinator: NavigationCoordinator,
    }

    fn mount_with(href: &str, config: CaptureConfig, sink: RecordingSink) -> Harness {
        let dom = FakeDom::at(href);
        let navigator = Rc::new(RecordingNavigator::default());
        let sink = Rc::new(sink);
        let coordinator =
            NavigationCoordinator::mount(config, dom.clone(), navigator.clone(), sink.clone());
        Harness {
            dom,
            navigator,
            sink,
            coordinator,
        }
    }

    fn mount(href: &str) -> Harness {
        mount_with(href, CaptureConfig::default(), RecordingSink::default())
    }

    #[test]
    fn test_initial_mount_reports_once() {
        let h = mount("/test-path?property_1=1&property_2=property");

        let reports = h.sink.reports.borrow();
        assert_eq!(reports.len(), 1);
        assert_eq!(reports[0][PAGE_NAME_KEY].as_str(), Some("Test Path"));
        assert_eq!(reports[0]["property_1"].as_i64(), Some(1));
        assert_eq!(reports[0]["property_2"].as_str(), Some("property"));
    }

    #[test]
    fn test_navigate_and_report_uses_override_once() {
        let h = mount("/");
        let handle = h.coordinator.handle();

        let mut props = PropertyMap::new();
        props.insert("plan".into(), "pro".into());
        handle
            .navigate_and_report("/checkout", Some("Checkout"), Some(props))
            .unwrap();

        assert_eq!(*h.navigator.requested.borrow(), vec!["/checkout".to_string()]);
        assert!(matches!(h.coordinator.state(), NavigationState::Pending(_)));
        assert_eq!(h.sink.reports.borrow().len(), 1);

        h.dom.go("/checkout");
        let report = h.coordinator.on_location_change().unwrap();
        assert_eq!(report.page_name, "Checkout");
        assert_eq!(report.properties["plan"].as_str(), Some("pro"));
        assert_eq!(h.coordinator.state(), NavigationState::Idle);

        h.dom.go("/");
        let report = h.coordinator.on_location_change().unwrap();
        assert_eq!(report.page_name, "Home Page");
        assert!(report.properties.get("plan").is_none());
        assert_eq!(h.sink.reports.borrow().len(), 3);
    }

    #[test]
    fn test_second_navigation_overwrites_pending_override() {
        let h = mount("/");
        let handle = h.coordinator.handle();

        handle.navigate_and_report("/a", Some("First"), None).unwrap();
        handle.navigate_and_report("/b", Some("Second"), None).unwrap();

        h.dom.go("/b");
        let report = h.coordinator.on_location_change().unwrap();
        assert_eq!(report.page_name, "Second");
        assert_eq!(h.navigator.requested.borrow().len(), 2);
    }

    #[test]
    fn test_suppressed_page_never_reaches_sink() {
        let mut rules = CaptureRules::new();
        rules.insert("private".into(), CaptureSet::new([CaptureSource::None]));
        let config = CaptureConfig::new(CaptureSet::default(), rules);

        let h = mount_with("/private?x=1", config, RecordingSink::default());
        assert!(h.sink.reports.borrow().is_empty());

        h.dom.go("/public");
        assert!(h.coordinator.on_location_change().is_some());
        assert_eq!(h.sink.reports.borrow().len(), 1);
    }

    #[test]
    fn test_schema_failure_drops_report_and_clears_override() {
        let config = CaptureConfig::new(CaptureSet::new([CaptureSource::Schema]), CaptureRules::new());
        let h = mount_with("/", config, RecordingSink::default());
        assert_eq!(h.sink.reports.borrow().len(), 1);

        h.dom.blocks.borrow_mut().push("{\"@type\": ".to_string());
        h.coordinator
            .handle()
            .navigate_and_report("/menu", Some("Menu"), None)
            .unwrap();
        h.dom.go("/menu");

        assert!(h.coordinator.on_location_change().is_none());
        assert_eq!(h.sink.reports.borrow().len(), 1);
        assert_eq!(h.coordinator.state(), NavigationState::Idle);
    }

    #[test]
    fn test_sink_error_is_not_propagated() {
        let sink = RecordingSink {
            fail: true,
            ..Default::default()
        };
        let h = mount_with("/", CaptureConfig::default(), sink);

        h.dom.go("/next");
        assert!(h.coordinator.on_location_change().is_some());
        assert_eq!(h.sink.reports.borrow().len(), 2);
    }

    #[test]
    fn test_replace_config() {
        let h = mount("/menu");
        h.coordinator.replace_config(CaptureConfig::new(
            CaptureSet::new([CaptureSource::Meta]),
            CaptureRules::new(),
        ));

        let report = h.coordinator.on_location_change().unwrap();
        assert_eq!(report.page_name, "Title");
    }

    #[test]
    fn test_handle_requires_mounted_coordinator() {
        let err = NavigateHandle::detached()
            .navigate_and_report("/x", None, None)
            .unwrap_err();
        assert!(matches!(err, Error::MissingContext));

        let h = mount("/");
        let handle = h.coordinator.handle();
        drop(h.coordinator);

        let err = handle.navigate_and_report("/x", None, None).unwrap_err();
        assert!(matches!(err, Error::MissingContext));
        assert!(h.navigator.requested.borrow().is_empty());
    }
}
