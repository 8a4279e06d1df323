use serde::{Deserialize, Deserializer};

pub mod event;

pub use event::Event;

// GitLab sends `null` for events without a target (pushes, joins) and
// hand-edited files may null any field. Null becomes the zero value; pair with
// `#[serde(default)]` so a missing field does too.
pub(crate) fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}
