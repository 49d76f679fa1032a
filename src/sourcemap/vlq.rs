const BASE64: &[u8; 64] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789+/";

const VLQ_BASE_SHIFT: u32 = 5;
const VLQ_BASE: i64 = 1 << VLQ_BASE_SHIFT;
const VLQ_BASE_MASK: i64 = VLQ_BASE - 1;
const VLQ_CONTINUATION_BIT: i64 = VLQ_BASE;

/// Append the base64 VLQ encoding of `value` to `out`.
pub fn encode(value: i64, out: &mut String) {
	let mut vlq = if value < 0 {
		((-value) << 1) | 1
	} else {
		value << 1
	};

	loop {
		let mut digit = vlq & VLQ_BASE_MASK;
		vlq >>= VLQ_BASE_SHIFT;
		if vlq > 0 {
			digit |= VLQ_CONTINUATION_BIT;
		}
		out.push(BASE64[digit as usize] as char);
		if vlq == 0 {
			break;
		}
	}
}
