//! Embedded static resources.
//!
//! - `template` - Template types for typed variable injection
//! - `serve` - the browser client script (hotline.js)
//! - `init` - starter config written by `hotline init`
//!
//! # Usage
//!
//! ```ignore
//! use embed::serve::{CLIENT_JS, ClientVars};
//!
//! let js = CLIENT_JS.render(&ClientVars { ws_port: 35729 });
//! ```

mod template;

pub use template::{Template, TemplateVars};

pub mod serve {
    use super::{Template, TemplateVars};

    /// Variables for hotline.js.
    pub struct ClientVars {
        pub ws_port: u16,
    }

    impl TemplateVars for ClientVars {
        fn apply(&self, content: &str) -> String {
            content.replace("__HOTLINE_WS_PORT__", &self.ws_port.to_string())
        }
    }

    /// Browser client script with WebSocket port injection.
    pub const CLIENT_JS: Template<ClientVars> =
        Template::new(include_str!("serve/hotline.js"));
}

pub mod init {
    /// Starter config written by `hotline init`.
    pub const CONFIG_TEMPLATE: &str = include_str!("init/hotline.toml");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_js_with_vars() {
        let vars = serve::ClientVars { ws_port: 35729 };
        let rendered = serve::CLIENT_JS.render(&vars);
        assert!(rendered.contains("35729"));
        assert!(!rendered.contains("__HOTLINE_WS_PORT__"));
    }

    #[test]
    fn test_client_js_handles_every_command() {
        let content = serve::CLIENT_JS.content();
        for command in [
            "init",
            "reloadPage",
            "reloadCSS",
            "reloadImage",
            "addModule",
            "updateModule",
            "removeModule",
            "syncModule",
        ] {
            assert!(content.contains(command), "client misses {command}");
        }
    }

    #[test]
    fn test_init_template_parses() {
        let parsed: Result<toml::Value, _> = toml::from_str(init::CONFIG_TEMPLATE);
        assert!(parsed.is_ok());
    }
}
