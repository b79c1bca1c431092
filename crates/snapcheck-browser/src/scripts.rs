//! JavaScript injected into pages
//!
//! Page-side code only gathers raw element facts (see
//! [`snapcheck_core::ElementProbe`]); it never decides visibility or builds
//! locators.

/// Name of the CDP runtime binding the observer reports through
pub const BINDING_NAME: &str = "__snapcheckVisibleItem";

/// Guard flag so an observer is installed at most once per document
const INSTALLED_FLAG: &str = "__snapcheckObserverInstalled";

/// Returns `JSON.stringify({width, height})` of the current viewport
pub const VIEWPORT_QUERY: &str =
    "JSON.stringify({ width: window.innerWidth, height: window.innerHeight })";

/// Scripts parameterized by the configured test attribute
#[derive(Debug, Clone)]
pub struct PageScripts {
    test_attribute: String,
}

impl PageScripts {
    pub fn new(test_attribute: impl Into<String>) -> Self {
        Self {
            test_attribute: test_attribute.into(),
        }
    }

    /// Function expression `el => probe` shared by extraction and observation
    fn probe_function(&self) -> String {
        let attribute = js_string(&self.test_attribute);
        format!(
            r#"(function (el) {{
    const rect = el.getBoundingClientRect();
    const style = window.getComputedStyle(el);
    const path = [];
    let reachedRoot = false;
    let curr = el;
    while (curr) {{
        if (curr === document.body) {{
            reachedRoot = true;
            break;
        }}
        const parent = curr.parentElement;
        const tagName = curr.tagName;
        let index = 1;
        let count = 1;
        if (parent) {{
            const same = Array.from(parent.children).filter(c => c.tagName === tagName);
            index = same.indexOf(curr) + 1;
            count = same.length;
        }}
        path.unshift({{ tag: tagName.toLowerCase(), index: index, count: count }});
        curr = parent;
    }}
    return {{
        tag: el.tagName.toLowerCase(),
        id: el.id || null,
        testId: el.getAttribute({attribute}),
        path: path,
        reachedRoot: reachedRoot,
        rect: {{ top: rect.top, left: rect.left, width: rect.width, height: rect.height }},
        style: {{ display: style.display, visibility: style.visibility, opacity: style.opacity }},
        text: typeof el.innerText === "string" ? el.innerText : "",
        scrollY: window.scrollY
    }};
}})"#
        )
    }

    /// Expression returning a JSON array of probes for every element under `body`
    pub fn extraction(&self) -> String {
        format!(
            r#"(() => {{
    const probe = {probe};
    return JSON.stringify(Array.from(document.querySelectorAll("body *")).map(probe));
}})()"#,
            probe = self.probe_function()
        )
    }

    /// Expression installing intersection + mutation observers that report each
    /// element entering the viewport through the runtime binding.
    ///
    /// Evaluates to `true` when installed, `false` when already present or the
    /// binding is missing.
    pub fn observer(&self) -> String {
        format!(
            r#"(() => {{
    if (window.{flag}) return false;
    const send = window.{binding};
    if (typeof send !== "function") return false;
    const probe = {probe};

    const emit = el => {{
        try {{
            send(JSON.stringify(probe(el)));
        }} catch (e) {{
            send(JSON.stringify({{ error: String(e) }}));
        }}
    }};

    const io = new IntersectionObserver(entries => {{
        entries.forEach(entry => {{
            if (entry.isIntersecting) emit(entry.target);
        }});
    }}, {{ threshold: 0.1 }});

    const watch = node => {{
        io.observe(node);
        if (node.querySelectorAll) node.querySelectorAll("*").forEach(child => io.observe(child));
    }};

    const start = () => {{
        if (!document.body || !(document.body instanceof Node)) return;
        document.body.querySelectorAll("*").forEach(el => io.observe(el));
        const mo = new MutationObserver(mutations => {{
            mutations.forEach(m => m.addedNodes.forEach(n => {{
                if (n.nodeType === 1) watch(n);
            }}));
        }});
        try {{
            mo.observe(document.body, {{ childList: true, subtree: true }});
        }} catch (e) {{
            // document torn down mid-install
        }}
    }};

    window.{flag} = true;
    if (document.readyState === "loading") {{
        document.addEventListener("DOMContentLoaded", start, {{ once: true }});
    }} else {{
        start();
    }}
    return true;
}})()"#,
            flag = INSTALLED_FLAG,
            binding = BINDING_NAME,
            probe = self.probe_function()
        )
    }
}

/// Scroll the window to a vertical offset
pub fn scroll_to(y: f64) -> String {
    let y = if y.is_finite() { y.max(0.0) } else { 0.0 };
    format!("window.scrollTo(0, {})", y)
}

/// Encode a Rust string as a JavaScript string literal
fn js_string(value: &str) -> String {
    serde_json::to_string(value).unwrap_or_else(|_| "\"\"".to_string())
}
