//! Helpers for loading the json fixtures under `src/fixtures` in tests.
//!
//! Paths resolve against this crate at compile time, so other crates' tests can use them.
pub fn read_fixture(name: &str) -> anyhow::Result<String> {
    let raw = std::fs::read_to_string(format!(
        "{}/src/fixtures/{name}",
        env!("CARGO_MANIFEST_DIR")
    ))?;
    Ok(raw.trim().to_string())
}

pub fn read_fixture_as<T>(name: &str) -> anyhow::Result<T>
where
    T: serde::de::DeserializeOwned,
{
    Ok(serde_json::from_str::<T>(&read_fixture(name)?)?)
}
