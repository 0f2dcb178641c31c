//! Line formatting for the lister; the library keeps timestamps raw, so
//! rendering them is this binary's job.

use chrono::DateTime;
use unifd::{DirEntry, FileType};

const fn type_char(file_type: FileType) -> char {
    match file_type {
        FileType::Directory => 'd',
        FileType::Symlink => 'l',
        FileType::Fifo => 'p',
        FileType::CharDevice => 'c',
        FileType::BlockDevice => 'b',
        FileType::Socket => 's',
        FileType::RegularFile => '-',
        FileType::Unknown => '?',
    }
}

fn mode_string(mode: u32) -> String {
    const BITS: [(u32, char); 9] = [
        (0o400, 'r'),
        (0o200, 'w'),
        (0o100, 'x'),
        (0o040, 'r'),
        (0o020, 'w'),
        (0o010, 'x'),
        (0o004, 'r'),
        (0o002, 'w'),
        (0o001, 'x'),
    ];
    BITS.iter()
        .map(|&(bit, ch)| if mode & bit != 0 { ch } else { '-' })
        .collect()
}

pub fn print_entry(entry: &DirEntry, long: bool) {
    let name = entry.name().to_string_lossy();
    if !long {
        println!("{name}");
        return;
    }
    let when = DateTime::from_timestamp(entry.modified(), 0)
        .map_or_else(|| "?".to_owned(), |t| t.format("%Y-%m-%d %H:%M").to_string());
    println!(
        "{}{} {:>12} {} {}",
        type_char(entry.file_type()),
        mode_string(u32::from(entry.mode())),
        entry.size(),
        when,
        name
    );
}
