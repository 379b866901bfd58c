use serde::Serialize;
use wellcat_core::error::WellcatError;

pub fn print<T: Serialize>(value: &T) -> Result<(), WellcatError> {
    let json = serde_json::to_string_pretty(value)?;
    println!("{json}");
    Ok(())
}
