//! # File System Module
//!
//! File system modules handle interactions with directories and files.  There is a sub-module for
//! each supported file system, at present only the Atari DOS 2 family (`dos2`), which covers
//! DOS 2.0, DOS 2.5 with enhanced density, and MyDOS.
//!
//! A file system object takes ownership of some `img::SectorStore`, which it uses as storage.
//! Sector skews and the packing of sectors into an image file are not handled here, that is
//! up to the `img` module.

pub mod dos2;
