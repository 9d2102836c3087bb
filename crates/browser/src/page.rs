//! [`UiQuery`] over a live Chromium tab.

use crate::scripts;
use async_trait::async_trait;
use chromiumoxide::layout::Point;
use chromiumoxide::page::Page;
use rollcall_harvest::{Element, UiError, UiQuery, UiResult};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::{Value, json};
use std::time::Duration;
use tracing::debug;

#[derive(Debug, Deserialize)]
struct ClickPoint {
    x: f64,
    y: f64,
    /// The element itself (or a descendant) is topmost at the point.
    clear: bool,
}

pub struct ChromiumUi {
    page: Page,
    home_url: String,
    poll_interval: Duration,
}

impl ChromiumUi {
    pub fn new(page: Page, home_url: impl Into<String>, poll_interval: Duration) -> Self {
        Self { page, home_url: home_url.into(), poll_interval }
    }

    async fn eval(&self, function: &str, target: Option<&Element>, extra: &[Value]) -> UiResult<Value> {
        let mut args = vec![target.map_or(Value::Null, |el| json!(el.handle()))];
        args.extend_from_slice(extra);

        let expression = scripts::call(function, &args);
        let mut value = self.evaluate(function, &expression).await?;
        if scripts::is_uninstalled(&value) {
            debug!("Installing page helpers");
            self.evaluate("install", &scripts::install()).await?;
            value = self.evaluate(function, &expression).await?;
        }

        if scripts::is_stale(&value) {
            let handle = target.map_or("document", |el| el.handle());
            return Err(UiError::Stale(handle.to_string()));
        }
        Ok(value)
    }

    async fn evaluate(&self, label: &str, expression: &str) -> UiResult<Value> {
        let result = self
            .page
            .evaluate(expression)
            .await
            .map_err(|e| UiError::Script(format!("{}: {}", label, e)))?;
        Ok(result.value().cloned().unwrap_or(Value::Null))
    }

    async fn eval_as<T: DeserializeOwned>(&self, function: &str, target: &Element, extra: &[Value]) -> UiResult<T> {
        let value = self.eval(function, Some(target), extra).await?;
        serde_json::from_value(value).map_err(|e| UiError::Script(format!("{}: unexpected result: {}", function, e)))
    }
}

#[async_trait]
impl UiQuery for ChromiumUi {
    async fn find(&self, scope: Option<&Element>, selector: &str) -> UiResult<Option<Element>> {
        let value = self.eval("__rcFindAll", scope, &[json!(selector), json!(1)]).await?;
        Ok(refs(value)?.into_iter().next())
    }

    async fn find_all(&self, scope: Option<&Element>, selector: &str) -> UiResult<Vec<Element>> {
        let value = self.eval("__rcFindAll", scope, &[json!(selector), json!(0)]).await?;
        refs(value)
    }

    async fn is_displayed(&self, element: &Element) -> UiResult<bool> {
        self.eval_as("__rcDisplayed", element, &[]).await
    }

    async fn click(&self, element: &Element) -> UiResult<bool> {
        let point: ClickPoint = self.eval_as("__rcClickPoint", element, &[]).await?;
        if !point.clear {
            debug!("{} is obstructed or has no box", element);
            return Ok(false);
        }

        let at = Point::new(point.x, point.y);
        self.page
            .move_mouse(at.clone())
            .await
            .map_err(|e| UiError::Script(format!("mouse move: {}", e)))?;
        self.page
            .click(at)
            .await
            .map_err(|e| UiError::Script(format!("mouse click: {}", e)))?;
        Ok(true)
    }

    async fn script_click(&self, element: &Element) -> UiResult<()> {
        self.eval("__rcScriptClick", Some(element), &[]).await.map(|_| ())
    }

    async fn type_text(&self, element: &Element, text: &str) -> UiResult<()> {
        self.eval("__rcFocusClear", Some(element), &[]).await?;
        if text.is_empty() {
            return Ok(());
        }

        // Key events go to whatever holds focus.
        let body = self
            .page
            .find_element("body")
            .await
            .map_err(|e| UiError::Script(format!("body lookup: {}", e)))?;
        body.type_str(text)
            .await
            .map_err(|e| UiError::Script(format!("typing: {}", e)))?;
        Ok(())
    }

    async fn attribute(&self, element: &Element, name: &str) -> UiResult<Option<String>> {
        self.eval_as("__rcAttr", element, &[json!(name)]).await
    }

    async fn text(&self, element: &Element) -> UiResult<String> {
        self.eval_as("__rcText", element, &[]).await
    }

    async fn scroll_to_bottom(&self, element: &Element) -> UiResult<()> {
        self.eval("__rcScrollBottom", Some(element), &[]).await.map(|_| ())
    }

    async fn measure_extent(&self, element: &Element) -> UiResult<u64> {
        let value = self.eval("__rcExtent", Some(element), &[]).await?;
        extent(&value).ok_or_else(|| UiError::Script(format!("non-numeric extent: {}", value)))
    }

    async fn reload(&self) -> UiResult<()> {
        self.page
            .goto(self.home_url.as_str())
            .await
            .map_err(|e| UiError::Navigation(format!("{}: {}", self.home_url, e)))?;
        Ok(())
    }

    fn poll_interval(&self) -> Duration {
        self.poll_interval
    }
}

fn refs(value: Value) -> UiResult<Vec<Element>> {
    let refs: Vec<String> =
        serde_json::from_value(value).map_err(|e| UiError::Script(format!("unexpected lookup result: {}", e)))?;
    Ok(refs.into_iter().map(Element::new).collect())
}

fn extent(value: &Value) -> Option<u64> {
    value.as_u64().or_else(|| value.as_f64().map(|v| v.max(0.0).round() as u64))
}
