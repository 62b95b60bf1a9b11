use std::collections::BTreeMap;

use log::info;

use super::document::Document;
use super::error::EditorError;

/// Every session key starts with this, so sessions can be listed.
pub const SESSION_PREFIX: &str = "graphSession";

/// The `sessionId` query parameter, if present and non-empty.
pub fn session_key_from_query(search: &str) -> Option<String> {
	let query = search.strip_prefix('?').unwrap_or(search);
	url::form_urlencoded::parse(query.as_bytes())
		.find(|(key, _)| key == "sessionId")
		.map(|(_, value)| value.trim().to_owned())
		.filter(|value| !value.is_empty())
}

/// Turns a user-typed session name into a storage key.
pub fn normalize_session_key(name: &str) -> String {
	let name = name.trim();
	if name.starts_with(SESSION_PREFIX) {
		name.to_owned()
	} else {
		format!("{SESSION_PREFIX}{name}")
	}
}

/// Fresh key for a page opened without `sessionId`. It is never written back
/// to the URL.
pub fn new_session_key() -> String {
	format!("{SESSION_PREFIX}-{}", uuid::Uuid::new_v4())
}

/// Query string that opens `key`.
pub fn session_query(key: &str) -> String {
	let query: String = url::form_urlencoded::Serializer::new(String::new())
		.append_pair("sessionId", key)
		.finish();
	format!("?{query}")
}

/// String key-value persistence, as offered by the browser's local storage.
pub trait KeyValueStore {
	fn get(&self, key: &str) -> Result<Option<String>, EditorError>;
	fn set(&mut self, key: &str, value: &str) -> Result<(), EditorError>;
	fn keys(&self) -> Result<Vec<String>, EditorError>;
}

/// `window.localStorage`.
pub struct BrowserStore {
	storage: web_sys::Storage,
}

impl BrowserStore {
	pub fn local() -> Result<Self, EditorError> {
		let window = web_sys::window().ok_or_else(|| EditorError::Dom("no window".into()))?;
		let storage = window
			.local_storage()
			.map_err(|err| EditorError::Storage(format!("{err:?}")))?
			.ok_or_else(|| EditorError::Storage("local storage disabled".into()))?;
		Ok(Self { storage })
	}
}

impl KeyValueStore for BrowserStore {
	fn get(&self, key: &str) -> Result<Option<String>, EditorError> {
		self.storage
			.get_item(key)
			.map_err(|err| EditorError::Storage(format!("{err:?}")))
	}

	fn set(&mut self, key: &str, value: &str) -> Result<(), EditorError> {
		self.storage
			.set_item(key, value)
			.map_err(|err| EditorError::Storage(format!("{err:?}")))
	}

	fn keys(&self) -> Result<Vec<String>, EditorError> {
		let length = self
			.storage
			.length()
			.map_err(|err| EditorError::Storage(format!("{err:?}")))?;
		let mut keys = Vec::with_capacity(length as usize);
		for index in 0..length {
			if let Some(key) = self
				.storage
				.key(index)
				.map_err(|err| EditorError::Storage(format!("{err:?}")))?
			{
				keys.push(key);
			}
		}
		Ok(keys)
	}
}

/// In-memory store for tests and for running without a browser.
#[derive(Clone, Debug, Default)]
pub struct MemoryStore {
	entries: BTreeMap<String, String>,
}

impl KeyValueStore for MemoryStore {
	fn get(&self, key: &str) -> Result<Option<String>, EditorError> {
		Ok(self.entries.get(key).cloned())
	}

	fn set(&mut self, key: &str, value: &str) -> Result<(), EditorError> {
		self.entries.insert(key.to_owned(), value.to_owned());
		Ok(())
	}

	fn keys(&self) -> Result<Vec<String>, EditorError> {
		Ok(self.entries.keys().cloned().collect())
	}
}

pub fn save_document(
	store: &mut impl KeyValueStore,
	key: &str,
	document: &Document,
) -> Result<(), EditorError> {
	store.set(key, &document.to_json()?)
}

/// `Ok(None)` when nothing is stored under `key`.
pub fn load_document(store: &impl KeyValueStore, key: &str) -> Result<Option<Document>, EditorError> {
	match store.get(key)? {
		Some(json) => {
			let document = Document::from_json(&json)?;
			info!("loaded session {key}");
			Ok(Some(document))
		}
		None => Ok(None),
	}
}

/// Stored session keys, sorted.
pub fn list_sessions(store: &impl KeyValueStore) -> Result<Vec<String>, EditorError> {
	let mut keys: Vec<String> = store
		.keys()?
		.into_iter()
		.filter(|key| key.starts_with(SESSION_PREFIX))
		.collect();
	keys.sort();
	Ok(keys)
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn query_selects_session() {
		assert_eq!(
			session_key_from_query("?shape=circle&sessionId=graphSessionwork"),
			Some("graphSessionwork".into())
		);
		assert_eq!(session_key_from_query("sessionId=a%20b"), Some("a b".into()));
		assert_eq!(session_key_from_query("?sessionId="), None);
		assert_eq!(session_key_from_query(""), None);
	}

	#[test]
	fn names_get_the_prefix_once() {
		assert_eq!(normalize_session_key(" work "), "graphSessionwork");
		assert_eq!(normalize_session_key("graphSessionwork"), "graphSessionwork");
		assert!(new_session_key().starts_with(SESSION_PREFIX));
		assert_ne!(new_session_key(), new_session_key());
		assert_eq!(session_query("graphSession a"), "?sessionId=graphSession+a");
	}

	#[test]
	fn save_load_and_list() {
		let mut store = MemoryStore::default();
		let mut document = Document::default();
		document.current_edge_dimension_id = Some("d".into());
		save_document(&mut store, "graphSessionB", &document).unwrap();
		save_document(&mut store, "graphSessionA", &Document::default()).unwrap();
		store.set("unrelated", "x").unwrap();

		assert_eq!(load_document(&store, "graphSessionB").unwrap(), Some(document));
		assert_eq!(load_document(&store, "graphSessionC").unwrap(), None);
		assert_eq!(list_sessions(&store).unwrap(), ["graphSessionA", "graphSessionB"]);
	}

	#[test]
	fn corrupt_entry_is_a_json_error() {
		let mut store = MemoryStore::default();
		store.set("graphSessionX", "{not json").unwrap();
		assert!(matches!(load_document(&store, "graphSessionX"), Err(EditorError::Json(_))));
	}
}
