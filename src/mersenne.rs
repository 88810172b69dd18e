//! # メルセンヌ・ツイスタ
//!
//! ワーカースレッドにランダムな遅延を入れるための、決定的な疑似乱数生成器である。
//! 各ワーカーが自分専用のインスタンスを所有するため、スレッド間で状態を共有しない。
//!
//! 標準的なMT19937とは初期化が異なり、バッファ全体をシードで埋めてから、
//! アルゴリズムを`MT_LEN * 100`回空回しして状態をかき混ぜる。
//! 出力は参照トレースとビット単位で一致する必要がある。

const MT_IA: usize = 397;
const MT_LEN: usize = 624;

/// 空回しする回数（バッファ長の倍数）
const WARMUP_ROUNDS: usize = 100;

pub struct MersenneTwister {
    buffer: [u32; MT_LEN],
    index: usize,
}

impl MersenneTwister {
    pub fn new(seed: u32) -> Self {
        let mut mt = Self {
            buffer: [seed; MT_LEN],
            index: 0,
        };
        for _ in 0..MT_LEN * WARMUP_ROUNDS {
            mt.integer();
        }
        mt
    }

    /// 次の疑似乱数を返す。
    ///
    /// インライン化させないことで、関数呼び出しそのものがコンパイラバリアとして働く。
    #[inline(never)]
    pub fn integer(&mut self) -> u32 {
        let i = self.index;
        let i2 = if i + 1 >= MT_LEN { 0 } else { i + 1 };
        let j = if i + MT_IA >= MT_LEN {
            i + MT_IA - MT_LEN
        } else {
            i + MT_IA
        };

        // ツイスト
        let s = (self.buffer[i] & 0x8000_0000) | (self.buffer[i2] & 0x7fff_ffff);
        let mut r = self.buffer[j] ^ (s >> 1) ^ ((s & 1) * 0x9908_B0DF);
        self.buffer[i] = r;
        self.index = i2;

        // テンパリング
        r ^= r >> 11;
        r ^= (r << 7) & 0x9d2c_5680;
        r ^= (r << 15) & 0xefc6_0000;
        r ^= r >> 18;
        r
    }

    /// `integer() % 8 == 0`となるまで乱数を引き続け、引いた回数を返す。
    ///
    /// スリープではなくCPUを消費するスピンである。リオーダーが起きる時間窓を
    /// 広げるためのもので、意図的にCPUを無駄遣いしている。期待値は8回。
    pub fn spin_delay(&mut self) -> u32 {
        let mut draws = 1;
        while self.integer() % 8 != 0 {
            draws += 1;
        }
        draws
    }
}
