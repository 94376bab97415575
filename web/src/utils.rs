use gloo::storage::errors::StorageError;
use gloo::storage::{LocalStorage, Storage};
use serde::{Serialize, de::DeserializeOwned};
use yew::prelude::*;

/// Local storage slot a type is persisted under.
pub(crate) trait StorageKey {
    const KEY: &'static str;
}

pub(crate) trait LocalOrDefault: Sized {
    fn local_or_default() -> Self;
}

/// Missing or unreadable entries load as `None`.
impl<T: StorageKey + DeserializeOwned> LocalOrDefault for Option<T> {
    fn local_or_default() -> Self {
        match LocalStorage::get(T::KEY) {
            Ok(value) => Some(value),
            Err(StorageError::KeyNotFound(_)) => None,
            Err(err) => {
                log::warn!("ignoring stored {}: {}", T::KEY, err);
                None
            }
        }
    }
}

pub(crate) trait LocalSave {
    fn local_save(&self);
}

/// Saving `None` clears the slot. Failures are logged and otherwise ignored.
impl<T: StorageKey + Serialize> LocalSave for Option<T> {
    fn local_save(&self) {
        let result = match self {
            Some(value) => LocalStorage::set(T::KEY, value),
            None => {
                LocalStorage::delete(T::KEY);
                Ok(())
            }
        };
        if let Err(err) = result {
            log::error!("failed to save {}: {}", T::KEY, err);
        }
    }
}

/// Helper function to use JavaScript's Math.random
pub(crate) fn js_random_seed() -> u64 {
    use js_sys::Math::random;
    let mut bytes = [0u8; 8];
    for byte in &mut bytes {
        *byte = (256. * random()) as u8;
    }
    u64::from_be_bytes(bytes)
}

#[derive(Properties, PartialEq)]
pub(crate) struct ModalProps {
    #[prop_or_default]
    pub children: Html,
}

/// Renders its children into document.body instead of in place.
#[function_component]
pub(crate) fn Modal(props: &ModalProps) -> Html {
    let modal_host = gloo::utils::body();
    create_portal(props.children.clone(), modal_host.into())
}
