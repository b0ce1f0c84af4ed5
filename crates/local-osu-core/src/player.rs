use crate::mods::Mods;

pub const DEFAULT_RANK: i32 = 9_999_999;

/// The local player as seen by the game client.
#[derive(Debug, Clone)]
pub struct Player {
    pub name: String,
    /// Set when the session came from a real client login; only then do stat
    /// refreshes get pushed back to the client.
    pub from_login: bool,
    pub queue: Vec<u8>,

    pub rank: i32,
    pub accuracy: f64,
    pub playcount: u32,
    pub total_score: u64,
    pub ranked_score: u64,
    pub pp: i64,

    pub mode: u8,
    pub mods: Mods,
    pub user_id: i32,
    pub action: u8,
    pub map_id: i32,
    pub map_md5: String,
    pub country: u8,
    pub utc_offset: i8,
    pub info_text: String,
    pub location: (f32, f32),
    pub privileges: u8,
}

impl Player {
    pub fn new(name: impl Into<String>, from_login: bool) -> Self {
        Self {
            name: name.into(),
            from_login,
            queue: Vec::new(),
            rank: DEFAULT_RANK,
            accuracy: 0.0,
            playcount: 0,
            total_score: 0,
            ranked_score: 0,
            pp: 0,
            mode: 0,
            mods: Mods::empty(),
            user_id: 2,
            action: 0,
            map_id: 0,
            map_md5: String::new(),
            country: 0,
            utc_offset: 0,
            info_text: String::new(),
            location: (0.0, 0.0),
            privileges: 63,
        }
    }

    pub fn enqueue(&mut self, bytes: &[u8]) {
        self.queue.extend_from_slice(bytes);
    }

    /// Take everything queued for the client, leaving the queue empty.
    pub fn clear(&mut self) -> Vec<u8> {
        std::mem::take(&mut self.queue)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clear_drains_queue() {
        let mut player = Player::new("cover", true);
        player.enqueue(&[1, 2]);
        player.enqueue(&[3]);

        assert_eq!(player.clear(), vec![1, 2, 3]);
        assert!(player.queue.is_empty());
        assert_eq!(player.rank, DEFAULT_RANK);
    }
}
