//! Scripted in-memory interface for engine tests.

use crate::ui::{Element, UiError, UiQuery, UiResult};
use async_trait::async_trait;
use rollcall_core::config::HarvestSettings;
use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::Mutex;

type Key = (Option<String>, String);

/// Settings with short, distinct selectors so scripted pages read clearly.
pub fn test_settings() -> HarvestSettings {
    let mut settings = HarvestSettings::default();
    let s = &mut settings.selectors;
    s.ready = "ready".into();
    s.search_box = "search-box".into();
    s.search_result = "search-row".into();
    s.sidebar_row = "sidebar-row".into();
    s.row_title = "title".into();
    s.conversation = "main".into();
    s.overlay = "overlay".into();
    s.panel_marker = "panel-marker".into();
    s.title_region = "title-region".into();
    s.header_container = "header".into();
    s.details_button = "details".into();
    s.member_count = "member-count".into();
    s.view_all = "view-all".into();
    s.member_list = "member-list".into();
    s.member_row = "member-row".into();
    s.member_name = "member-name".into();
    s.phone_slot = "phone-slot".into();
    s.phone_title = "phone-title".into();
    s.role_badge = "badge".into();
    settings
}

#[derive(Debug, Clone)]
pub enum Effect {
    /// Replaces whatever `selector` matched under `scope`.
    Set { scope: Option<String>, selector: String, handles: Vec<String> },
    Hide(String),
    Show(String),
}

impl Effect {
    pub fn set(scope: Option<&str>, selector: &str, handles: &[&str]) -> Self {
        Effect::Set {
            scope: scope.map(str::to_string),
            selector: selector.to_string(),
            handles: handles.iter().map(|h| h.to_string()).collect(),
        }
    }
}

#[derive(Default)]
struct Extent {
    current: u64,
    after_scroll: VecDeque<u64>,
}

#[derive(Default)]
struct State {
    matches: HashMap<Key, Vec<String>>,
    attributes: HashMap<(String, String), String>,
    texts: HashMap<String, String>,
    hidden: HashSet<String>,
    stale: HashSet<String>,
    broken: HashSet<String>,
    blocked: HashSet<String>,
    script_failing: HashSet<String>,
    on_click: HashMap<String, Vec<Effect>>,
    on_type: HashMap<(String, String), Vec<Effect>>,
    on_reload: Vec<Effect>,
    extents: HashMap<String, Extent>,
    log: Vec<String>,
}

impl State {
    fn apply(&mut self, effects: Vec<Effect>) {
        for effect in effects {
            match effect {
                Effect::Set { scope, selector, handles } => {
                    self.matches.insert((scope, selector), handles);
                }
                Effect::Hide(handle) => {
                    self.hidden.insert(handle);
                }
                Effect::Show(handle) => {
                    self.hidden.remove(&handle);
                }
            }
        }
    }

    fn check(&self, handle: &str) -> UiResult<()> {
        if self.stale.contains(handle) {
            return Err(UiError::Stale(handle.to_string()));
        }
        if self.broken.contains(handle) {
            return Err(UiError::Script(format!("lookup under {} threw", handle)));
        }
        Ok(())
    }

    fn lookup(&self, scope: Option<&Element>, selector: &str) -> UiResult<Vec<Element>> {
        if let Some(scope) = scope {
            self.check(scope.handle())?;
        }
        let key = (scope.map(|s| s.handle().to_string()), selector.to_string());
        Ok(self
            .matches
            .get(&key)
            .map(|handles| handles.iter().map(Element::new).collect())
            .unwrap_or_default())
    }

    fn activate(&mut self, handle: &str) {
        let effects = self.on_click.get(handle).cloned().unwrap_or_default();
        self.apply(effects);
    }
}

#[derive(Default)]
pub struct FakeUi {
    state: Mutex<State>,
}

impl FakeUi {
    pub fn new() -> Self {
        Self::default()
    }

    fn with<R>(&self, f: impl FnOnce(&mut State) -> R) -> R {
        let mut state = self.state.lock().unwrap();
        f(&mut state)
    }

    pub fn add(&self, scope: Option<&str>, selector: &str, handles: &[&str]) {
        self.with(|s| s.apply(vec![Effect::set(scope, selector, handles)]));
    }

    pub fn attr(&self, handle: &str, name: &str, value: &str) {
        self.with(|s| {
            s.attributes.insert((handle.to_string(), name.to_string()), value.to_string());
        });
    }

    pub fn set_text(&self, handle: &str, value: &str) {
        self.with(|s| {
            s.texts.insert(handle.to_string(), value.to_string());
        });
    }

    pub fn hide(&self, handle: &str) {
        self.with(|s| s.apply(vec![Effect::Hide(handle.to_string())]));
    }

    pub fn stale(&self, handle: &str) {
        self.with(|s| {
            s.stale.insert(handle.to_string());
        });
    }

    /// Every lookup scoped under `handle` fails with a script error.
    pub fn broken(&self, handle: &str) {
        self.with(|s| {
            s.broken.insert(handle.to_string());
        });
    }

    /// Native clicks on `handle` report "did not land".
    pub fn block_native(&self, handle: &str) {
        self.with(|s| {
            s.blocked.insert(handle.to_string());
        });
    }

    pub fn fail_script(&self, handle: &str) {
        self.with(|s| {
            s.script_failing.insert(handle.to_string());
        });
    }

    pub fn on_click(&self, handle: &str, effect: Effect) {
        self.with(|s| s.on_click.entry(handle.to_string()).or_default().push(effect));
    }

    pub fn on_type(&self, handle: &str, text: &str, effect: Effect) {
        self.with(|s| {
            s.on_type
                .entry((handle.to_string(), text.to_string()))
                .or_default()
                .push(effect)
        });
    }

    pub fn on_reload(&self, effect: Effect) {
        self.with(|s| s.on_reload.push(effect));
    }

    /// Extent starts at `initial`; each scroll advances to the next scripted value.
    pub fn extents(&self, handle: &str, initial: u64, after_scroll: &[u64]) {
        self.with(|s| {
            s.extents.insert(
                handle.to_string(),
                Extent { current: initial, after_scroll: after_scroll.iter().copied().collect() },
            );
        });
    }

    pub fn interactions(&self) -> Vec<String> {
        self.with(|s| s.log.clone())
    }

    pub fn count(&self, prefix: &str) -> usize {
        self.with(|s| s.log.iter().filter(|entry| entry.starts_with(prefix)).count())
    }
}

#[async_trait]
impl UiQuery for FakeUi {
    async fn find(&self, scope: Option<&Element>, selector: &str) -> UiResult<Option<Element>> {
        self.with(|s| Ok(s.lookup(scope, selector)?.into_iter().next()))
    }

    async fn find_all(&self, scope: Option<&Element>, selector: &str) -> UiResult<Vec<Element>> {
        self.with(|s| s.lookup(scope, selector))
    }

    async fn is_displayed(&self, element: &Element) -> UiResult<bool> {
        self.with(|s| {
            s.check(element.handle())?;
            Ok(!s.hidden.contains(element.handle()))
        })
    }

    async fn click(&self, element: &Element) -> UiResult<bool> {
        self.with(|s| {
            s.log.push(format!("click:{}", element));
            s.check(element.handle())?;
            if s.blocked.contains(element.handle()) {
                return Ok(false);
            }
            s.activate(element.handle());
            Ok(true)
        })
    }

    async fn script_click(&self, element: &Element) -> UiResult<()> {
        self.with(|s| {
            s.log.push(format!("script_click:{}", element));
            s.check(element.handle())?;
            if s.script_failing.contains(element.handle()) {
                return Err(UiError::Script("click() threw".into()));
            }
            s.activate(element.handle());
            Ok(())
        })
    }

    async fn type_text(&self, element: &Element, text: &str) -> UiResult<()> {
        self.with(|s| {
            s.log.push(format!("type:{}:{}", element, text));
            s.check(element.handle())?;
            let effects = s
                .on_type
                .get(&(element.handle().to_string(), text.to_string()))
                .cloned()
                .unwrap_or_default();
            s.apply(effects);
            Ok(())
        })
    }

    async fn attribute(&self, element: &Element, name: &str) -> UiResult<Option<String>> {
        self.with(|s| {
            s.check(element.handle())?;
            Ok(s.attributes.get(&(element.handle().to_string(), name.to_string())).cloned())
        })
    }

    async fn text(&self, element: &Element) -> UiResult<String> {
        self.with(|s| {
            s.check(element.handle())?;
            Ok(s.texts.get(element.handle()).cloned().unwrap_or_default())
        })
    }

    async fn scroll_to_bottom(&self, element: &Element) -> UiResult<()> {
        self.with(|s| {
            s.log.push(format!("scroll:{}", element));
            s.check(element.handle())?;
            if let Some(extent) = s.extents.get_mut(element.handle()) {
                if let Some(next) = extent.after_scroll.pop_front() {
                    extent.current = next;
                }
            }
            Ok(())
        })
    }

    async fn measure_extent(&self, element: &Element) -> UiResult<u64> {
        self.with(|s| {
            s.check(element.handle())?;
            Ok(s.extents.get(element.handle()).map(|e| e.current).unwrap_or(0))
        })
    }

    async fn reload(&self) -> UiResult<()> {
        self.with(|s| {
            s.log.push("reload".to_string());
            let effects = s.on_reload.clone();
            s.apply(effects);
            Ok(())
        })
    }
}
