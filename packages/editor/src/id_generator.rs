use crc32fast::Hasher;

/// Stable short hash of `source`, used to seed node ids
pub fn get_seed(source: &str) -> String {
    let mut hasher = Hasher::new();
    hasher.update(source.as_bytes());
    format!("{:x}", hasher.finalize())
}

/// Sequential id generator for nodes and popups created in one session
#[derive(Clone, Debug)]
pub struct IdGenerator {
    seed: String, // CRC32 of the session identity
    count: u32,   // Sequential counter
}

impl IdGenerator {
    pub fn new(source: &str) -> Self {
        Self {
            seed: get_seed(source),
            count: 0,
        }
    }

    pub fn from_seed(seed: impl Into<String>) -> Self {
        Self {
            seed: seed.into(),
            count: 0,
        }
    }

    /// Generate next sequential id
    pub fn new_id(&mut self) -> String {
        self.count += 1;
        format!("{}-{}", self.seed, self.count)
    }

    /// Next id for which `taken` is false
    pub fn new_unique_id(&mut self, taken: impl Fn(&str) -> bool) -> String {
        loop {
            let id = self.new_id();
            if !taken(&id) {
                return id;
            }
        }
    }

    pub fn seed(&self) -> &str {
        &self.seed
    }
}
