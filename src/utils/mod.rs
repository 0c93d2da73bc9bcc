pub mod file_kind;
#[cfg(test)]
pub mod test_helpers;
