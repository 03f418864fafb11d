use mtrack_core::SchemaVersion;

pub fn list() {
    for version in SchemaVersion::all() {
        let marker = if version.is_current() { " (current)" } else { "" };
        println!("{:>3}  {}{}", version.index(), version, marker);
    }
}
