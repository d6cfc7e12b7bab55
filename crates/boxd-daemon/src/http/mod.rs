pub mod button;
pub mod health;
pub mod jobs;
pub mod status;

#[cfg(test)]
pub(crate) mod test_support;
