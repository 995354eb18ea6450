#![allow(dead_code)]

macro_rules! assert_hex_eq {
    ($a:expr, $b:expr) => {
        pretty_assertions::assert_str_eq!(hex::encode($a), hex::encode($b))
    };
}

pub const VERTEX: u32 = 1;
pub const PIXEL: u32 = 2;

/// Length prefixed shader name and content.
pub fn shader_data(name: &str, content: &str) -> Vec<u8> {
    let mut bytes = Vec::new();
    bytes.extend_from_slice(&(name.len() as u32).to_le_bytes());
    bytes.extend_from_slice(name.as_bytes());
    bytes.extend_from_slice(&(content.len() as u32).to_le_bytes());
    bytes.extend_from_slice(content.as_bytes());
    bytes
}

/// A hand written container independent of the library's builder.
pub struct Container {
    pub magic: [u8; 4],
    pub version: u32,
    pub checksum: bool,
    pub sections: Vec<(u32, Vec<u8>)>,
    /// Bytes between the table and the first section.
    pub padding: Vec<u8>,
    /// Bytes after the declared file size.
    pub trailing: Vec<u8>,
}

impl Container {
    pub fn new(sections: Vec<(u32, Vec<u8>)>) -> Self {
        Self {
            magic: *b"KSHC",
            version: 1,
            checksum: true,
            sections,
            padding: Vec::new(),
            trailing: Vec::new(),
        }
    }

    pub fn shaders(vs: (&str, &str), ps: (&str, &str)) -> Self {
        Self::new(vec![
            (VERTEX, shader_data(vs.0, vs.1)),
            (PIXEL, shader_data(ps.0, ps.1)),
        ])
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        let table_size = self.sections.len() * 12;
        let mut bytes = Vec::new();
        bytes.extend_from_slice(&self.magic);
        bytes.extend_from_slice(&self.version.to_le_bytes());
        bytes.extend_from_slice(&(self.checksum as u32).to_le_bytes());
        bytes.extend_from_slice(&0u32.to_le_bytes());
        bytes.extend_from_slice(&(self.sections.len() as u32).to_le_bytes());
        bytes.extend_from_slice(&24u32.to_le_bytes());

        let mut offset = 24 + table_size + self.padding.len();
        for (kind, data) in &self.sections {
            bytes.extend_from_slice(&kind.to_le_bytes());
            bytes.extend_from_slice(&(offset as u32).to_le_bytes());
            bytes.extend_from_slice(&(data.len() as u32).to_le_bytes());
            offset += data.len();
        }
        bytes.extend_from_slice(&self.padding);
        for (_, data) in &self.sections {
            bytes.extend_from_slice(data);
        }

        let file_size = bytes.len() + if self.checksum { 4 } else { 0 };
        bytes[12..16].copy_from_slice(&(file_size as u32).to_le_bytes());
        if self.checksum {
            let checksum = crc32fast::hash(&bytes);
            bytes.extend_from_slice(&checksum.to_le_bytes());
        }
        bytes.extend_from_slice(&self.trailing);
        bytes
    }
}

/// Recalculate the checksum after modifying bytes in a test.
pub fn fix_checksum(bytes: &mut [u8]) {
    let file_size = u32::from_le_bytes(bytes[12..16].try_into().unwrap()) as usize;
    let checksum = crc32fast::hash(&bytes[..file_size - 4]);
    bytes[file_size - 4..file_size].copy_from_slice(&checksum.to_le_bytes());
}

pub fn string(value: &str) -> Vec<u8> {
    let mut bytes = (value.len() as u32).to_le_bytes().to_vec();
    bytes.extend_from_slice(value.as_bytes());
    bytes
}

pub fn words(values: &[u32]) -> Vec<u8> {
    values.iter().flat_map(|v| v.to_le_bytes()).collect()
}

/// A legacy file with a vec4 uniform `a` and a sampler uniform `b`.
/// The vertex shader uses `a` and the pixel shader uses `a` and `b`.
pub fn legacy_bytes(vs: (&str, &str), ps: (&str, &str)) -> Vec<u8> {
    [
        string("anim"),
        words(&[2]),
        string("a"),
        words(&[0, 4, 1, 4, 0, 0, 0, 0x3f800000]),
        string("b"),
        words(&[0, 43, 1]),
        string(vs.0),
        words(&[vs.1.len() as u32 + 1]),
        vs.1.as_bytes().to_vec(),
        vec![0],
        string(ps.0),
        words(&[ps.1.len() as u32 + 1]),
        ps.1.as_bytes().to_vec(),
        vec![0],
        words(&[1, 0]),
        words(&[2, 0, 1]),
    ]
    .concat()
}
