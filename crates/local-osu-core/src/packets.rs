use crate::player::Player;

pub const SEND_MESSAGE: u16 = 7;
pub const USER_STATS: u16 = 11;

/// Encodes the outbound packets this crate produces. The full packet layer
/// lives with the server; this is the subset stat refreshes and local
/// notifications need.
pub trait PacketEncoder: Send + Sync {
    fn user_stats(&self, player: &Player) -> Vec<u8>;

    fn message(&self, sender: &str, message: &str, target: &str, sender_id: i32) -> Vec<u8>;

    /// A chat line from the server itself.
    fn local_message(&self, message: &str, channel: Option<&str>) -> Vec<u8> {
        self.message("local", message, channel.unwrap_or("#osu"), -1)
    }
}

/// Standard bancho framing: `u16` id, one padding byte, `u32` body length,
/// all little-endian.
#[derive(Debug, Default, Clone, Copy)]
pub struct BanchoEncoder;

impl PacketEncoder for BanchoEncoder {
    fn user_stats(&self, player: &Player) -> Vec<u8> {
        let mut body = PacketBody::default();
        body.i32(player.user_id);
        body.u8(player.action);
        body.string(&player.info_text);
        body.string(&player.map_md5);
        body.i32(player.mods.bits() as i32);
        body.u8(player.mode);
        body.i32(player.map_id);
        body.i64(player.ranked_score as i64);
        body.f32((player.accuracy / 100.0) as f32);
        body.i32(player.playcount as i32);
        body.i64(player.total_score as i64);
        body.i32(player.rank);
        // pp travels as i16 on the wire
        body.i16(player.pp.clamp(0, i16::MAX as i64) as i16);
        body.finish(USER_STATS)
    }

    fn message(&self, sender: &str, message: &str, target: &str, sender_id: i32) -> Vec<u8> {
        let mut body = PacketBody::default();
        body.string(sender);
        body.string(message);
        body.string(target);
        body.i32(sender_id);
        body.finish(SEND_MESSAGE)
    }
}

#[derive(Default)]
struct PacketBody {
    buf: Vec<u8>,
}

impl PacketBody {
    fn u8(&mut self, v: u8) {
        self.buf.push(v);
    }

    fn i16(&mut self, v: i16) {
        self.buf.extend_from_slice(&v.to_le_bytes());
    }

    fn i32(&mut self, v: i32) {
        self.buf.extend_from_slice(&v.to_le_bytes());
    }

    fn i64(&mut self, v: i64) {
        self.buf.extend_from_slice(&v.to_le_bytes());
    }

    fn f32(&mut self, v: f32) {
        self.buf.extend_from_slice(&v.to_le_bytes());
    }

    fn string(&mut self, s: &str) {
        if s.is_empty() {
            self.buf.push(0x00);
            return;
        }

        self.buf.push(0x0b);
        let mut len = s.len();
        loop {
            let mut byte = (len & 0x7f) as u8;
            len >>= 7;
            if len != 0 {
                byte |= 0x80;
            }
            self.buf.push(byte);
            if len == 0 {
                break;
            }
        }
        self.buf.extend_from_slice(s.as_bytes());
    }

    fn finish(self, packet_id: u16) -> Vec<u8> {
        let mut packet = Vec::with_capacity(self.buf.len() + 7);
        packet.extend_from_slice(&packet_id.to_le_bytes());
        packet.push(0);
        packet.extend_from_slice(&(self.buf.len() as u32).to_le_bytes());
        packet.extend_from_slice(&self.buf);
        packet
    }
}
