//! In-page helpers evaluated through DevTools.
//!
//! Elements cross the protocol boundary as refs: a `data-rollcall-ref`
//! attribute stamped on the node. A ref whose node has left the document
//! resolves to nothing, and every helper then answers `{ stale: true }`.
//!
//! The helpers are installed once per document under `window.__rc`. A call
//! made before installation (or after a navigation) answers
//! `{ uninstalled: true }` and the caller installs and retries.

use serde_json::Value;

const PRELUDE: &str = r#"
    const REF_ATTR = 'data-rollcall-ref';

    function __rcResolve(ref) {
        if (ref === null) return document;
        return document.querySelector('[' + REF_ATTR + '="' + ref + '"]');
    }

    function __rcTag(el) {
        let ref = el.getAttribute(REF_ATTR);
        if (!ref) {
            window.__rcNext = (window.__rcNext || 0) + 1;
            ref = 'r' + window.__rcNext;
            el.setAttribute(REF_ATTR, ref);
        }
        return ref;
    }

    function __rcIsXPath(selector) {
        return selector.startsWith('/') || selector.startsWith('./') || selector.startsWith('(');
    }

    function __rcIsVisible(el) {
        if (el.hidden || el.getAttribute('aria-hidden') === 'true') return false;
        const style = getComputedStyle(el);
        if (style.display === 'none' || style.visibility === 'hidden' || parseFloat(style.opacity) === 0) return false;
        const rect = el.getBoundingClientRect();
        return rect.width > 0 || rect.height > 0;
    }

    function __rcScroller(el) {
        for (let node = el; node && node !== document.body; node = node.parentElement) {
            const overflow = getComputedStyle(node).overflowY;
            if ((overflow === 'auto' || overflow === 'scroll') && node.scrollHeight > node.clientHeight) return node;
        }
        return el;
    }

    function __rcFindAll(scopeRef, selector, limit) {
        const scope = __rcResolve(scopeRef);
        if (!scope) return { stale: true };
        let nodes = [];
        if (__rcIsXPath(selector)) {
            // Absolute paths are anchored to the scope when one is given.
            const expr = (scope !== document && selector.startsWith('/')) ? '.' + selector : selector;
            const snap = document.evaluate(expr, scope, null, XPathResult.ORDERED_NODE_SNAPSHOT_TYPE, null);
            for (let i = 0; i < snap.snapshotLength; i++) nodes.push(snap.snapshotItem(i));
        } else {
            nodes = Array.from(scope.querySelectorAll(selector));
        }
        nodes = nodes.filter(n => n.nodeType === Node.ELEMENT_NODE);
        if (limit > 0) nodes = nodes.slice(0, limit);
        return nodes.map(__rcTag);
    }

    function __rcDisplayed(ref) {
        const el = __rcResolve(ref);
        if (!el) return { stale: true };
        return __rcIsVisible(el);
    }

    function __rcClickPoint(ref) {
        const el = __rcResolve(ref);
        if (!el) return { stale: true };
        el.scrollIntoView({ behavior: 'instant', block: 'center', inline: 'center' });
        const r = el.getBoundingClientRect();
        if (r.width === 0 || r.height === 0) return { x: 0, y: 0, clear: false };
        const x = r.left + r.width / 2.0;
        const y = r.top + r.height / 2.0;
        const hit = document.elementFromPoint(x, y);
        return { x, y, clear: !!hit && (hit === el || el.contains(hit)) };
    }

    function __rcScriptClick(ref) {
        const el = __rcResolve(ref);
        if (!el) return { stale: true };
        ['mousedown', 'mouseup', 'click'].forEach(type => {
            el.dispatchEvent(new MouseEvent(type, { bubbles: true, cancelable: true, view: window, buttons: 1 }));
        });
        return true;
    }

    function __rcFocusClear(ref) {
        const el = __rcResolve(ref);
        if (!el) return { stale: true };
        el.focus();
        if ('value' in el) {
            el.value = '';
        } else {
            document.execCommand('selectAll', false, null);
            document.execCommand('delete', false, null);
        }
        el.dispatchEvent(new Event('input', { bubbles: true }));
        return true;
    }

    function __rcAttr(ref, name) {
        const el = __rcResolve(ref);
        if (!el) return { stale: true };
        return el.getAttribute(name);
    }

    function __rcText(ref) {
        const el = __rcResolve(ref);
        if (!el) return { stale: true };
        return el.innerText || el.textContent || '';
    }

    function __rcScrollBottom(ref) {
        const el = __rcResolve(ref);
        if (!el) return { stale: true };
        const scroller = __rcScroller(el);
        scroller.scrollTop = scroller.scrollHeight;
        return true;
    }

    function __rcExtent(ref) {
        const el = __rcResolve(ref);
        if (!el) return { stale: true };
        return __rcScroller(el).scrollHeight;
    }
"#;

/// Helpers reachable through `window.__rc`.
const EXPORTS: [&str; 9] = [
    "__rcFindAll",
    "__rcDisplayed",
    "__rcClickPoint",
    "__rcScriptClick",
    "__rcFocusClear",
    "__rcAttr",
    "__rcText",
    "__rcScrollBottom",
    "__rcExtent",
];

/// Defines the helpers on the current document unless already present.
pub fn install() -> String {
    format!(
        "(function() {{\nif (!window.__rc) {{\nwindow.__rc = (function() {{\n{}\nreturn {{ {} }};\n}})();\n}}\nreturn true;\n}})()",
        PRELUDE,
        EXPORTS.join(", ")
    )
}

/// A call to an installed helper. Carries only the helper name and arguments.
pub fn call(function: &str, args: &[Value]) -> String {
    let args = args.iter().map(Value::to_string).collect::<Vec<_>>().join(", ");
    format!(
        "(window.__rc ? window.__rc.{}({}) : {{ uninstalled: true }})",
        function, args
    )
}

/// The document has no helpers yet.
pub fn is_uninstalled(value: &Value) -> bool {
    value.get("uninstalled").and_then(Value::as_bool).unwrap_or(false)
}

/// The marker every helper returns when its ref no longer resolves.
pub fn is_stale(value: &Value) -> bool {
    value.get("stale").and_then(Value::as_bool).unwrap_or(false)
}
