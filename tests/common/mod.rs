//! In-memory archive builder for tests and benches.
#![allow(dead_code)]

use ggpk::util::encode_name;

pub const ROOT_OFFSET: u64 = ggpk::HEADER_SIZE as u64;

pub enum Node {
    Dir(String, Vec<Node>),
    File(String, Vec<u8>),
    Free(usize),
}

pub fn dir(name: &str, children: Vec<Node>) -> Node {
    Node::Dir(name.to_string(), children)
}

pub fn file(name: &str, data: &[u8]) -> Node {
    Node::File(name.to_string(), data.to_vec())
}

pub fn free(payload: usize) -> Node {
    Node::Free(payload)
}

// ── Raw records ───────────────────────────────────────────────────────────────

pub fn header(version: u32, magic: &[u8; 4], root_offset: u64) -> Vec<u8> {
    let mut out = Vec::with_capacity(ggpk::HEADER_SIZE);
    out.extend_from_slice(&version.to_le_bytes());
    out.extend_from_slice(magic);
    out.extend_from_slice(&0u32.to_le_bytes());
    out.extend_from_slice(&root_offset.to_le_bytes());
    out.extend_from_slice(&0u64.to_le_bytes());
    out
}

pub fn dir_record(name: &str, child_offsets: &[u64]) -> Vec<u8> {
    let name = encode_name(name);
    let len = 8 + 4 + 4 + 32 + name.len() + 12 * child_offsets.len();
    let mut out = Vec::with_capacity(len);
    out.extend_from_slice(&(len as u32).to_le_bytes());
    out.extend_from_slice(b"PDIR");
    out.extend_from_slice(&((name.len() / 2) as i32).to_le_bytes());
    out.extend_from_slice(&(child_offsets.len() as u32).to_le_bytes());
    out.extend_from_slice(&[0xAB; 32]);
    out.extend_from_slice(&name);
    for (i, offset) in child_offsets.iter().enumerate() {
        out.extend_from_slice(&(i as u32).to_le_bytes());
        out.extend_from_slice(&offset.to_le_bytes());
    }
    out
}

/// A FILE record; `length` overrides the stored record length.
pub fn file_record(name: &str, data: &[u8], length: Option<u32>) -> Vec<u8> {
    let name = encode_name(name);
    let natural = 8 + 4 + 32 + name.len() + data.len();
    let mut out = Vec::with_capacity(natural);
    out.extend_from_slice(&length.unwrap_or(natural as u32).to_le_bytes());
    out.extend_from_slice(b"FILE");
    out.extend_from_slice(&((name.len() / 2) as i32).to_le_bytes());
    out.extend_from_slice(&[0xCD; 32]);
    out.extend_from_slice(&name);
    out.extend_from_slice(data);
    out
}

pub fn free_record(payload: usize) -> Vec<u8> {
    let mut out = Vec::with_capacity(8 + payload);
    out.extend_from_slice(&((8 + payload) as u32).to_le_bytes());
    out.extend_from_slice(b"FREE");
    out.resize(8 + payload, 0);
    out
}

pub fn raw_record(tag: &[u8; 4], body: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(8 + body.len());
    out.extend_from_slice(&((8 + body.len()) as u32).to_le_bytes());
    out.extend_from_slice(tag);
    out.extend_from_slice(body);
    out
}

// ── Layout ────────────────────────────────────────────────────────────────────

fn record_size(node: &Node) -> u64 {
    match node {
        Node::Dir(name, children) => dir_record(name, &vec![0; children.len()]).len() as u64,
        Node::File(name, data) => file_record(name, data, None).len() as u64,
        Node::Free(payload) => 8 + *payload as u64,
    }
}

fn subtree_size(node: &Node) -> u64 {
    match node {
        Node::Dir(_, children) => record_size(node) + children.iter().map(subtree_size).sum::<u64>(),
        _ => record_size(node),
    }
}

fn emit(node: &Node, out: &mut Vec<u8>) {
    let offset = out.len() as u64;
    match node {
        Node::Dir(name, children) => {
            let mut cursor = offset + record_size(node);
            let mut offsets = Vec::with_capacity(children.len());
            for child in children {
                offsets.push(cursor);
                cursor += subtree_size(child);
            }
            out.extend_from_slice(&dir_record(name, &offsets));
            for child in children {
                emit(child, out);
            }
        }
        Node::File(name, data) => out.extend_from_slice(&file_record(name, data, None)),
        Node::Free(payload) => out.extend_from_slice(&free_record(*payload)),
    }
}

/// Serialize `root` in pre-order right after a version 1 header.
pub fn build(root: &Node) -> Vec<u8> {
    let mut out = header(1, b"GGPK", ROOT_OFFSET);
    emit(root, &mut out);
    out
}
