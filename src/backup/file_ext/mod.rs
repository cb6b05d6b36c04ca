/// Suffix appended to files produced by a stage of the backup.
pub trait FileExtProvider {
    fn file_ext(&self) -> Option<impl AsRef<str>>;
}
