//! Transport helpers emitted at the top of every generated dispatcher.
//!
//! These implement the byte rings directly over the shared memory window
//! with volatile accesses. Reads block by polling the producer cursor;
//! writes block on the consumer cursor when the response ring is full.

use std::fmt::Write;

use crate::layout::TargetLayout;

pub fn emit(out: &mut String, layout: &TargetLayout) -> std::fmt::Result {
    writeln!(out, "#include <stdint.h>")?;
    writeln!(out)?;
    writeln!(out, "#define CC_CMD_BASE   {:#010x}u", layout.cmd_base)?;
    writeln!(out, "#define CC_RESP_BASE  {:#010x}u", layout.resp_base)?;
    writeln!(out, "#define CC_RING_BYTES {}u", layout.data_bytes())?;
    writeln!(out)?;
    out.push_str(RING_HELPERS);
    Ok(())
}

const RING_HELPERS: &str = r#"#define CC_CMD_HEAD  ((volatile uint32_t *)CC_CMD_BASE)
#define CC_CMD_TAIL  ((volatile uint32_t *)(CC_CMD_BASE + 4u))
#define CC_CMD_DATA  ((volatile uint8_t *)(CC_CMD_BASE + 8u))
#define CC_RESP_HEAD ((volatile uint32_t *)CC_RESP_BASE)
#define CC_RESP_TAIL ((volatile uint32_t *)(CC_RESP_BASE + 4u))
#define CC_RESP_DATA ((volatile uint8_t *)(CC_RESP_BASE + 8u))

static inline uint32_t cc_cmd_buffered(void)
{
    uint32_t head = *CC_CMD_HEAD;
    uint32_t tail = *CC_CMD_TAIL;
    return (head >= tail) ? (head - tail) : (head + CC_RING_BYTES - tail);
}

static inline uint32_t cc_resp_space(void)
{
    uint32_t head = *CC_RESP_HEAD;
    uint32_t tail = *CC_RESP_TAIL;
    uint32_t used = (head >= tail) ? (head - tail) : (head + CC_RING_BYTES - tail);
    return CC_RING_BYTES - 1u - used;
}

static inline uint8_t cc_read_u8(void)
{
    while (cc_cmd_buffered() == 0u) { }
    uint32_t tail = *CC_CMD_TAIL;
    uint8_t b = CC_CMD_DATA[tail];
    *CC_CMD_TAIL = (tail + 1u) % CC_RING_BYTES;
    return b;
}

static inline uint16_t cc_read_u16(void)
{
    uint16_t lo = (uint16_t)cc_read_u8();
    uint16_t hi = (uint16_t)cc_read_u8();
    return (uint16_t)(lo | (hi << 8));
}

static inline uint32_t cc_read_u32(void)
{
    uint32_t v = (uint32_t)cc_read_u8();
    v |= (uint32_t)cc_read_u8() << 8;
    v |= (uint32_t)cc_read_u8() << 16;
    v |= (uint32_t)cc_read_u8() << 24;
    return v;
}

static inline uint64_t cc_read_u64(void)
{
    uint64_t lo = (uint64_t)cc_read_u32();
    uint64_t hi = (uint64_t)cc_read_u32();
    return lo | (hi << 32);
}

static inline float cc_read_f32(void)
{
    union { uint32_t u; float f; } v;
    v.u = cc_read_u32();
    return v.f;
}

static inline double cc_read_f64(void)
{
    union { uint64_t u; double f; } v;
    v.u = cc_read_u64();
    return v.f;
}

static inline void cc_read_bytes(uint8_t *dst, uint32_t len)
{
    for (uint32_t i = 0u; i < len; i++) {
        dst[i] = cc_read_u8();
    }
}

static inline void cc_write_u8(uint8_t b)
{
    while (cc_resp_space() == 0u) { }
    uint32_t head = *CC_RESP_HEAD;
    CC_RESP_DATA[head] = b;
    *CC_RESP_HEAD = (head + 1u) % CC_RING_BYTES;
}

static inline void cc_write_u16(uint16_t v)
{
    cc_write_u8((uint8_t)(v & 0xffu));
    cc_write_u8((uint8_t)(v >> 8));
}

static inline void cc_write_u32(uint32_t v)
{
    cc_write_u8((uint8_t)(v & 0xffu));
    cc_write_u8((uint8_t)((v >> 8) & 0xffu));
    cc_write_u8((uint8_t)((v >> 16) & 0xffu));
    cc_write_u8((uint8_t)(v >> 24));
}

static inline void cc_write_u64(uint64_t v)
{
    cc_write_u32((uint32_t)(v & 0xffffffffu));
    cc_write_u32((uint32_t)(v >> 32));
}

static inline void cc_write_f32(float f)
{
    union { uint32_t u; float f; } v;
    v.f = f;
    cc_write_u32(v.u);
}

static inline void cc_write_f64(double f)
{
    union { uint64_t u; double f; } v;
    v.f = f;
    cc_write_u64(v.u);
}

static inline void cc_write_bytes(const uint8_t *src, uint32_t len)
{
    for (uint32_t i = 0u; i < len; i++) {
        cc_write_u8(src[i]);
    }
}

/* Interleaved print service: callable from application code while a
 * dispatch is in flight. The host logs the message and keeps waiting
 * for the terminal frame. */
void cc_print(const char *msg)
{
    uint32_t len = 0u;
    while (msg[len] != '\0' && len < 0xffffu) {
        len++;
    }
    cc_write_u8(1u);
    cc_write_u16((uint16_t)len);
    cc_write_bytes((const uint8_t *)msg, len);
}
"#;
