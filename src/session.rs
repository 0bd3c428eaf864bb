//! Authenticated session state.
//!
//! The token lives behind a [`TokenStore`] so the CLI can keep it in a file
//! while tests keep it in memory. Listeners are told whenever the token
//! changes, including changes made by another process and picked up by
//! [`Session::refresh`].

use std::fs;
use std::io::{self, ErrorKind};
use std::path::PathBuf;

use log::{debug, info};

pub trait TokenStore {
    fn get(&self) -> io::Result<Option<String>>;
    fn set(&mut self, token: &str) -> io::Result<()>;
    fn clear(&mut self) -> io::Result<()>;
}

pub struct FileTokenStore {
    path: PathBuf,
}

impl FileTokenStore {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }
}

impl TokenStore for FileTokenStore {
    fn get(&self) -> io::Result<Option<String>> {
        match fs::read_to_string(&self.path) {
            Ok(raw) => {
                let token = raw.trim();
                Ok(if token.is_empty() { None } else { Some(token.to_string()) })
            }
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(None),
            Err(err) => Err(err),
        }
    }

    fn set(&mut self, token: &str) -> io::Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&self.path, token)
    }

    fn clear(&mut self) -> io::Result<()> {
        match fs::remove_file(&self.path) {
            Err(err) if err.kind() != ErrorKind::NotFound => Err(err),
            _ => Ok(()),
        }
    }
}

#[cfg(test)]
#[derive(Debug, Default, Clone)]
pub struct MemoryTokenStore {
    token: Option<String>,
}

#[cfg(test)]
impl TokenStore for MemoryTokenStore {
    fn get(&self) -> io::Result<Option<String>> {
        Ok(self.token.clone())
    }

    fn set(&mut self, token: &str) -> io::Result<()> {
        self.token = Some(token.to_string());
        Ok(())
    }

    fn clear(&mut self) -> io::Result<()> {
        self.token = None;
        Ok(())
    }
}

type Listener = Box<dyn Fn(Option<&str>)>;

pub struct Session {
    store: Box<dyn TokenStore>,
    token: Option<String>,
    listeners: Vec<Listener>,
}

impl Session {
    pub fn new(store: Box<dyn TokenStore>) -> io::Result<Self> {
        let token = store.get()?;
        Ok(Self {
            store,
            token,
            listeners: Vec::new(),
        })
    }

    pub fn token(&self) -> Option<&str> {
        self.token.as_deref()
    }

    pub fn is_authenticated(&self) -> bool {
        self.token.is_some()
    }

    pub fn subscribe(&mut self, listener: impl Fn(Option<&str>) + 'static) {
        self.listeners.push(Box::new(listener));
    }

    pub fn login(&mut self, token: &str) -> io::Result<()> {
        let token = token.trim();
        if token.is_empty() {
            return Err(io::Error::new(ErrorKind::InvalidInput, "token must not be empty"));
        }
        self.store.set(token)?;
        info!("session token stored");
        self.update(Some(token.to_string()));
        Ok(())
    }

    pub fn logout(&mut self) -> io::Result<()> {
        self.store.clear()?;
        info!("session token cleared");
        self.update(None);
        Ok(())
    }

    /// Re-reads the store. Returns true when the token changed underneath us.
    pub fn refresh(&mut self) -> io::Result<bool> {
        let stored = self.store.get()?;
        if stored == self.token {
            return Ok(false);
        }
        debug!("session token changed outside this process");
        self.update(stored);
        Ok(true)
    }

    fn update(&mut self, token: Option<String>) {
        if token == self.token {
            return;
        }
        self.token = token;
        for listener in &self.listeners {
            listener(self.token.as_deref());
        }
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::fs;
    use std::rc::Rc;

    use super::{FileTokenStore, MemoryTokenStore, Session, TokenStore};

    #[test]
    fn notifies_listeners_on_change_only() {
        let mut session = Session::new(Box::new(MemoryTokenStore::default())).unwrap();
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&seen);
        session.subscribe(move |token| sink.borrow_mut().push(token.map(str::to_string)));

        session.login("abc").unwrap();
        session.login("abc").unwrap();
        session.logout().unwrap();

        assert_eq!(*seen.borrow(), vec![Some("abc".to_string()), None]);
        assert!(!session.is_authenticated());
        assert!(session.login("   ").is_err());
    }

    #[test]
    fn refresh_picks_up_changes_from_another_process() {
        let mut path = std::env::temp_dir();
        path.push(format!("wrappedup_session_token_{}", std::process::id()));
        let _ = fs::remove_file(&path);

        let mut session = Session::new(Box::new(FileTokenStore::new(path.clone()))).unwrap();
        assert_eq!(session.token(), None);
        assert!(!session.refresh().unwrap());

        FileTokenStore::new(path.clone()).set("from-elsewhere\n").unwrap();
        assert!(session.refresh().unwrap());
        assert_eq!(session.token(), Some("from-elsewhere"));

        session.logout().unwrap();
        assert!(!path.exists());
        session.logout().unwrap();
    }
}
