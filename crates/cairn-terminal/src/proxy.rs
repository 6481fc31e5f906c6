//! Connection proxy seam.
//!
//! Commands flagged as requiring a connection only run while the session's
//! proxy reports a logged-in user. The concrete proxy comes from whichever
//! [`ProxyFactory`] a loaded library supplied; without one the shell runs on
//! [`NullProxy`].

use cairn_types::error::{Result, ShellError};

/// A live (or absent) session with one or more servers.
pub trait ConnectionProxy {
    fn is_logged_in(&self) -> bool;

    /// User name of the open session, empty when disconnected.
    fn connected_user(&self) -> String;

    /// Servers of the open session, empty when disconnected.
    fn server_list(&self) -> String;

    /// Open a session from `login` arguments or `-login:` launch flags.
    fn connect(&mut self, args: &[String]) -> Result<()>;

    fn disconnect(&mut self) -> Result<()>;
}

/// Creates the session proxy. At most one is active per shell.
pub trait ProxyFactory: Send + Sync {
    /// Name used in registration diagnostics.
    fn name(&self) -> &str;

    fn create_proxy(&self) -> Box<dyn ConnectionProxy>;
}

/// Proxy used when no library provides a factory.
#[derive(Debug, Default)]
pub struct NullProxy;

impl ConnectionProxy for NullProxy {
    fn is_logged_in(&self) -> bool {
        false
    }

    fn connected_user(&self) -> String {
        String::new()
    }

    fn server_list(&self) -> String {
        String::new()
    }

    fn connect(&mut self, _args: &[String]) -> Result<()> {
        Err(ShellError::NotSupported(
            "no proxy factory was provided: connect is not available".to_string(),
        ))
    }

    fn disconnect(&mut self) -> Result<()> {
        Err(ShellError::NotSupported(
            "no proxy factory was provided: disconnect is not available".to_string(),
        ))
    }
}

/// Factory for [`NullProxy`].
#[derive(Debug, Default)]
pub struct NullProxyFactory;

impl ProxyFactory for NullProxyFactory {
    fn name(&self) -> &str {
        "null"
    }

    fn create_proxy(&self) -> Box<dyn ConnectionProxy> {
        Box::new(NullProxy)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn null_proxy_is_disconnected() {
        let p = NullProxyFactory.create_proxy();
        assert!(!p.is_logged_in());
        assert!(p.connected_user().is_empty());
        assert!(p.server_list().is_empty());
    }

    #[test]
    fn null_proxy_rejects_connect_and_disconnect() {
        let mut p = NullProxy;
        assert_eq!(p.connect(&[]).unwrap_err().kind(), "NotSupported");
        assert_eq!(p.disconnect().unwrap_err().kind(), "NotSupported");
    }
}
