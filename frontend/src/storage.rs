use regional_pulse_shared::{KeyValueStore, MemoryStore, StorageError};
use wasm_bindgen::JsValue;

/// `window.localStorage`, or a session-only map when the browser refuses
/// access (private mode, disabled storage).
pub enum BrowserStorage {
    Local(web_sys::Storage),
    Session(MemoryStore),
}

impl BrowserStorage {
    pub fn open() -> Self {
        match web_sys::window().map(|win| win.local_storage()) {
            Some(Ok(Some(storage))) => Self::Local(storage),
            Some(Err(err)) => {
                web_sys::console::warn_1(
                    &format!("localStorage unavailable, using memory: {}", js_message(&err))
                        .into(),
                );
                Self::Session(MemoryStore::new())
            },
            _ => Self::Session(MemoryStore::new()),
        }
    }
}

impl KeyValueStore for BrowserStorage {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        match self {
            Self::Local(storage) => storage.get_item(key).map_err(|err| StorageError::Read {
                key: key.to_string(),
                message: js_message(&err),
            }),
            Self::Session(memory) => memory.get(key),
        }
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        match self {
            Self::Local(storage) => storage.set_item(key, value).map_err(|err| StorageError::Write {
                key: key.to_string(),
                message: js_message(&err),
            }),
            Self::Session(memory) => memory.set(key, value),
        }
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        match self {
            Self::Local(storage) => storage.remove_item(key).map_err(|err| StorageError::Write {
                key: key.to_string(),
                message: js_message(&err),
            }),
            Self::Session(memory) => memory.remove(key),
        }
    }

    fn keys(&self) -> Result<Vec<String>, StorageError> {
        let storage = match self {
            Self::Local(storage) => storage,
            Self::Session(memory) => return memory.keys(),
        };
        let length = storage
            .length()
            .map_err(|err| StorageError::Unavailable(js_message(&err)))?;
        let mut keys = Vec::with_capacity(length as usize);
        for index in 0..length {
            if let Ok(Some(key)) = storage.key(index) {
                keys.push(key);
            }
        }
        Ok(keys)
    }
}

pub fn js_message(value: &JsValue) -> String {
    value
        .as_string()
        .or_else(|| {
            js_sys::Reflect::get(value, &JsValue::from_str("message"))
                .ok()
                .and_then(|message| message.as_string())
        })
        .unwrap_or_else(|| format!("{value:?}"))
}
