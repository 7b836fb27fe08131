//! Compound File Binary (OLE2) container reading.
//!
//! A read-only [MS-CFB] parser operating over an owned byte slice. The
//! container is a file-system-in-a-file: a FAT of 32-bit next-sector
//! pointers (located through the header's DIFAT), a mini-FAT for small
//! streams, and a directory of 128-byte entries arranged as a red-black
//! tree. Streams below the mini cut-off live in the root entry's
//! mini-stream in 64-byte chunks; everything else follows the regular FAT
//! in sector-size chunks.

use crate::error::{XlsError, XlsResult};

/// CFB file signature.
const SIGNATURE: [u8; 8] = [0xD0, 0xCF, 0x11, 0xE0, 0xA1, 0xB1, 0x1A, 0xE1];

/// Largest regular sector number; anything above is a sentinel.
const MAXREGSECT: u32 = 0xFFFF_FFFA;
/// Chain terminator.
const ENDOFCHAIN: u32 = 0xFFFF_FFFE;
/// Unallocated sector.
const FREESECT: u32 = 0xFFFF_FFFF;
/// "No sibling/child" directory sentinel.
const NOSTREAM: u32 = 0xFFFF_FFFF;

/// Corruption guard on sector-chain traversal.
const MAX_CHAIN_HOPS: usize = 100_000;

/// Directory entry types.
const TYPE_STORAGE: u8 = 1;
const TYPE_STREAM: u8 = 2;
const TYPE_ROOT: u8 = 5;

/// One parsed 128-byte directory entry.
#[derive(Debug, Clone)]
pub struct DirEntry {
    /// UTF-16-decoded entry name
    pub name: String,
    /// 1 = storage, 2 = stream, 5 = root
    pub entry_type: u8,
    /// Left sibling in the red-black tree
    pub left: u32,
    /// Right sibling in the red-black tree
    pub right: u32,
    /// First child (for storages and the root)
    pub child: u32,
    /// First sector of the stream
    pub start_sector: u32,
    /// Stream size in bytes
    pub size: u64,
}

/// A parsed, read-only CFB container.
#[derive(Debug)]
pub struct CompoundFile<'a> {
    data: &'a [u8],
    sector_size: usize,
    mini_sector_size: usize,
    mini_cutoff: u32,
    fat: Vec<u32>,
    minifat: Vec<u32>,
    entries: Vec<DirEntry>,
    /// Full path per directory entry (`/`, `/Workbook`, `/Storage/Stream`),
    /// parallel to `entries`; unreachable entries hold an empty string.
    paths: Vec<String>,
}

impl<'a> CompoundFile<'a> {
    /// Parse a CFB container from a byte slice.
    pub fn open(data: &'a [u8]) -> XlsResult<Self> {
        if data.len() < 512 {
            return Err(XlsError::MalformedContainer(format!(
                "file too short for a CFB header: {} bytes",
                data.len()
            )));
        }
        if data[0..8] != SIGNATURE {
            return Err(XlsError::MalformedContainer("bad signature".into()));
        }

        let byte_order = u16_at(data, 0x1C);
        if byte_order != 0xFFFE {
            return Err(XlsError::MalformedContainer(format!(
                "bad byte-order mark 0x{byte_order:04X}"
            )));
        }

        let sector_shift = u16_at(data, 0x1E);
        let mini_sector_shift = u16_at(data, 0x20);
        if !(7..=20).contains(&sector_shift) || mini_sector_shift >= sector_shift {
            return Err(XlsError::MalformedContainer(format!(
                "implausible sector shifts {sector_shift}/{mini_sector_shift}"
            )));
        }

        let first_dir_sector = u32_at(data, 0x30);
        let mini_cutoff = u32_at(data, 0x38);
        let first_minifat_sector = u32_at(data, 0x3C);
        let num_minifat_sectors = u32_at(data, 0x40);
        let first_difat_sector = u32_at(data, 0x44);
        let num_difat_sectors = u32_at(data, 0x48);

        let mut cfb = CompoundFile {
            data,
            sector_size: 1usize << sector_shift,
            mini_sector_size: 1usize << mini_sector_shift,
            mini_cutoff,
            fat: Vec::new(),
            minifat: Vec::new(),
            entries: Vec::new(),
            paths: Vec::new(),
        };

        cfb.load_fat(first_difat_sector, num_difat_sectors)?;
        if num_minifat_sectors > 0 && first_minifat_sector <= MAXREGSECT {
            let raw = cfb.read_chain(first_minifat_sector)?;
            cfb.minifat = raw.chunks_exact(4).map(le_u32).collect();
        }
        cfb.load_directory(first_dir_sector)?;
        cfb.build_paths();

        Ok(cfb)
    }

    /// All materialised entry paths (root is `/`).
    pub fn paths(&self) -> impl Iterator<Item = &str> {
        self.paths.iter().filter(|p| !p.is_empty()).map(String::as_str)
    }

    /// Whether a stream exists (case-insensitive; leading `/` optional).
    pub fn exists(&self, path: &str) -> bool {
        self.entry_index(path).is_some()
    }

    /// Extract a stream's bytes by path, case-insensitively.
    pub fn find_stream(&self, path: &str) -> XlsResult<Vec<u8>> {
        let idx = self
            .entry_index(path)
            .ok_or_else(|| XlsError::MissingStream(path.to_string()))?;
        let entry = &self.entries[idx];
        if entry.entry_type != TYPE_STREAM {
            return Err(XlsError::MissingStream(format!("{path} is not a stream")));
        }

        if (entry.size as u32) < self.mini_cutoff {
            self.read_mini_stream(entry.start_sector, entry.size as usize)
        } else {
            let mut bytes = self.read_chain(entry.start_sector)?;
            bytes.truncate(entry.size as usize);
            Ok(bytes)
        }
    }

    fn entry_index(&self, path: &str) -> Option<usize> {
        let wanted = if path.starts_with('/') {
            path.to_string()
        } else {
            format!("/{path}")
        };
        self.paths
            .iter()
            .position(|p| !p.is_empty() && p.eq_ignore_ascii_case(&wanted))
    }

    // ── Construction ─────────────────────────────────────────────────────

    /// Collect FAT sector numbers from the 109 inline DIFAT entries plus
    /// the chained DIFAT sectors, then load them into one flat table.
    fn load_fat(&mut self, first_difat: u32, num_difat: u32) -> XlsResult<()> {
        let mut fat_sectors = Vec::new();
        for i in 0..109 {
            let sector = u32_at(self.data, 0x4C + i * 4);
            if sector > MAXREGSECT {
                break;
            }
            fat_sectors.push(sector);
        }

        let mut difat_sector = first_difat;
        let per_sector = self.sector_size / 4 - 1;
        for _ in 0..num_difat.min(MAX_CHAIN_HOPS as u32) {
            if difat_sector > MAXREGSECT {
                break;
            }
            let sector = self.sector(difat_sector)?;
            for i in 0..per_sector {
                let entry = le_u32(&sector[i * 4..i * 4 + 4]);
                if entry > MAXREGSECT {
                    continue;
                }
                fat_sectors.push(entry);
            }
            difat_sector = le_u32(&sector[per_sector * 4..per_sector * 4 + 4]);
        }

        self.fat = Vec::with_capacity(fat_sectors.len() * (self.sector_size / 4));
        for id in fat_sectors {
            let sector = self.sector(id)?;
            self.fat.extend(sector.chunks_exact(4).map(le_u32));
        }

        Ok(())
    }

    /// Parse the directory stream into 128-byte entries.
    fn load_directory(&mut self, first_dir_sector: u32) -> XlsResult<()> {
        let dir = self.read_chain(first_dir_sector)?;
        for raw in dir.chunks_exact(128) {
            self.entries.push(parse_dir_entry(raw));
        }
        if self.entries.is_empty() {
            return Err(XlsError::MalformedContainer("empty directory".into()));
        }
        Ok(())
    }

    /// Walk the red-black tree from the root, assigning a full path to
    /// every reachable entry. Siblings share their parent's path prefix;
    /// a storage's child subtree nests one level deeper.
    fn build_paths(&mut self) {
        self.paths = vec![String::new(); self.entries.len()];
        self.paths[0] = "/".to_string();
        let mut visited = vec![false; self.entries.len()];
        visited[0] = true;

        let root_child = self.entries[0].child;
        self.walk_siblings(root_child, "", &mut visited);
    }

    fn walk_siblings(&mut self, idx: u32, parent_path: &str, visited: &mut [bool]) {
        if idx == NOSTREAM {
            return;
        }
        let i = idx as usize;
        if i >= self.entries.len() || visited[i] {
            return;
        }
        visited[i] = true;

        let (left, right, child, name, entry_type) = {
            let e = &self.entries[i];
            (e.left, e.right, e.child, e.name.clone(), e.entry_type)
        };

        self.walk_siblings(left, parent_path, visited);

        let path = format!("{parent_path}/{name}");
        if entry_type == TYPE_STORAGE || entry_type == TYPE_STREAM {
            self.paths[i] = path.clone();
        }
        if entry_type == TYPE_STORAGE {
            self.walk_siblings(child, &path, visited);
        }

        self.walk_siblings(right, parent_path, visited);
    }

    // ── Sector access ────────────────────────────────────────────────────

    /// Raw bytes of sector `n` (sector 0 starts right after the header).
    /// The returned slice borrows the backing data, not the parser.
    fn sector(&self, n: u32) -> XlsResult<&'a [u8]> {
        let start = (n as usize + 1) * self.sector_size;
        let end = start + self.sector_size;
        if end > self.data.len() {
            return Err(XlsError::MalformedContainer(format!(
                "sector {n} lies beyond the file end"
            )));
        }
        Ok(&self.data[start..end])
    }

    /// Concatenate a FAT chain starting at `start`.
    fn read_chain(&self, start: u32) -> XlsResult<Vec<u8>> {
        let mut out = Vec::new();
        let mut sector = start;
        let mut hops = 0usize;

        while sector != ENDOFCHAIN && sector != FREESECT {
            hops += 1;
            if hops > MAX_CHAIN_HOPS {
                return Err(XlsError::MalformedContainer(
                    "FAT chain exceeds the traversal guard".into(),
                ));
            }
            out.extend_from_slice(self.sector(sector)?);
            sector = *self.fat.get(sector as usize).ok_or_else(|| {
                XlsError::MalformedContainer(format!("sector {sector} has no FAT entry"))
            })?;
        }

        Ok(out)
    }

    /// Serve a small stream from the mini-stream, following the mini-FAT
    /// in mini-sector chunks and truncating to the exact size.
    fn read_mini_stream(&self, start: u32, size: usize) -> XlsResult<Vec<u8>> {
        let root = &self.entries[0];
        let mut ministream = self.read_chain(root.start_sector)?;
        ministream.truncate(root.size as usize);

        let mut out = Vec::with_capacity(size);
        let mut sector = start;
        let mut hops = 0usize;

        while sector != ENDOFCHAIN && sector != FREESECT {
            hops += 1;
            if hops > MAX_CHAIN_HOPS {
                return Err(XlsError::MalformedContainer(
                    "mini-FAT chain exceeds the traversal guard".into(),
                ));
            }
            let offset = sector as usize * self.mini_sector_size;
            let end = offset + self.mini_sector_size;
            if end > ministream.len() {
                return Err(XlsError::MalformedContainer(format!(
                    "mini sector {sector} lies beyond the mini-stream"
                )));
            }
            out.extend_from_slice(&ministream[offset..end]);
            sector = *self.minifat.get(sector as usize).ok_or_else(|| {
                XlsError::MalformedContainer(format!("mini sector {sector} has no mini-FAT entry"))
            })?;
        }

        out.truncate(size);
        Ok(out)
    }
}

/// Parse one raw 128-byte directory entry.
fn parse_dir_entry(raw: &[u8]) -> DirEntry {
    let name_len = u16_at(raw, 64) as usize;
    let name_bytes = &raw[..name_len.saturating_sub(2).min(64)];
    let units: Vec<u16> = name_bytes.chunks_exact(2).map(le_u16).collect();
    let name = String::from_utf16_lossy(&units)
        .trim_end_matches('\0')
        .to_string();

    // 512-byte-sector files only use the low size dword.
    let size = u32_at(raw, 120) as u64;

    DirEntry {
        name,
        entry_type: raw[66],
        left: u32_at(raw, 68),
        right: u32_at(raw, 72),
        child: u32_at(raw, 76),
        start_sector: u32_at(raw, 116),
        size,
    }
}

fn le_u16(b: &[u8]) -> u16 {
    u16::from_le_bytes([b[0], b[1]])
}

fn le_u32(b: &[u8]) -> u32 {
    u32::from_le_bytes([b[0], b[1], b[2], b[3]])
}

fn u16_at(data: &[u8], offset: usize) -> u16 {
    le_u16(&data[offset..offset + 2])
}

fn u32_at(data: &[u8], offset: usize) -> u32 {
    le_u32(&data[offset..offset + 4])
}
