//! The nine-region grouping used to lay out the prefecture picker.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Official name and romanization of every prefecture, indexed by `code - 1`.
const PREFECTURE_NAMES: [(&str, &str); 47] = [
    ("北海道", "Hokkaido"),
    ("青森県", "Aomori"),
    ("岩手県", "Iwate"),
    ("宮城県", "Miyagi"),
    ("秋田県", "Akita"),
    ("山形県", "Yamagata"),
    ("福島県", "Fukushima"),
    ("茨城県", "Ibaraki"),
    ("栃木県", "Tochigi"),
    ("群馬県", "Gunma"),
    ("埼玉県", "Saitama"),
    ("千葉県", "Chiba"),
    ("東京都", "Tokyo"),
    ("神奈川県", "Kanagawa"),
    ("新潟県", "Niigata"),
    ("富山県", "Toyama"),
    ("石川県", "Ishikawa"),
    ("福井県", "Fukui"),
    ("山梨県", "Yamanashi"),
    ("長野県", "Nagano"),
    ("岐阜県", "Gifu"),
    ("静岡県", "Shizuoka"),
    ("愛知県", "Aichi"),
    ("三重県", "Mie"),
    ("滋賀県", "Shiga"),
    ("京都府", "Kyoto"),
    ("大阪府", "Osaka"),
    ("兵庫県", "Hyogo"),
    ("奈良県", "Nara"),
    ("和歌山県", "Wakayama"),
    ("鳥取県", "Tottori"),
    ("島根県", "Shimane"),
    ("岡山県", "Okayama"),
    ("広島県", "Hiroshima"),
    ("山口県", "Yamaguchi"),
    ("徳島県", "Tokushima"),
    ("香川県", "Kagawa"),
    ("愛媛県", "Ehime"),
    ("高知県", "Kochi"),
    ("福岡県", "Fukuoka"),
    ("佐賀県", "Saga"),
    ("長崎県", "Nagasaki"),
    ("熊本県", "Kumamoto"),
    ("大分県", "Oita"),
    ("宮崎県", "Miyazaki"),
    ("鹿児島県", "Kagoshima"),
    ("沖縄県", "Okinawa"),
];

/// Romanized name of a prefecture code, `None` outside 1..=47.
pub fn romaji(code: u32) -> Option<&'static str> {
    let idx = usize::try_from(code).ok()?.checked_sub(1)?;
    PREFECTURE_NAMES.get(idx).map(|&(_, en)| en)
}

/// Romanized form of an official prefecture name such as `東京都`.
pub fn romanize(name: &str) -> Option<&'static str> {
    let name = name.trim();
    PREFECTURE_NAMES
        .iter()
        .find(|&&(ja, _)| ja == name)
        .map(|&(_, en)| en)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Region {
    Hokkaido,
    Tohoku,
    Kanto,
    HokurikuShinetsu,
    Chubu,
    Kinki,
    Chugoku,
    Shikoku,
    KyushuOkinawa,
}

impl Region {
    /// North to south, the order the picker shows them in.
    pub const ALL: [Region; 9] = [
        Region::Hokkaido,
        Region::Tohoku,
        Region::Kanto,
        Region::HokurikuShinetsu,
        Region::Chubu,
        Region::Kinki,
        Region::Chugoku,
        Region::Shikoku,
        Region::KyushuOkinawa,
    ];

    pub fn id(self) -> &'static str {
        match self {
            Region::Hokkaido => "hokkaido",
            Region::Tohoku => "tohoku",
            Region::Kanto => "kanto",
            Region::HokurikuShinetsu => "hokuriku-shinetsu",
            Region::Chubu => "chubu",
            Region::Kinki => "kinki",
            Region::Chugoku => "chugoku",
            Region::Shikoku => "shikoku",
            Region::KyushuOkinawa => "kyushu-okinawa",
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Region::Hokkaido => "北海道",
            Region::Tohoku => "東北",
            Region::Kanto => "関東",
            Region::HokurikuShinetsu => "北陸/信越",
            Region::Chubu => "中部",
            Region::Kinki => "近畿",
            Region::Chugoku => "中国",
            Region::Shikoku => "四国",
            Region::KyushuOkinawa => "九州/沖縄",
        }
    }

    /// Member prefecture codes, ascending.
    pub fn prefecture_codes(self) -> &'static [u32] {
        match self {
            Region::Hokkaido => &[1],
            Region::Tohoku => &[2, 3, 4, 5, 6, 7],
            Region::Kanto => &[8, 9, 10, 11, 12, 13, 14],
            Region::HokurikuShinetsu => &[15, 16, 17, 18, 19, 20],
            Region::Chubu => &[21, 22, 23],
            Region::Kinki => &[24, 25, 26, 27, 28, 29, 30],
            Region::Chugoku => &[31, 32, 33, 34, 35],
            Region::Shikoku => &[36, 37, 38, 39],
            Region::KyushuOkinawa => &[40, 41, 42, 43, 44, 45, 46, 47],
        }
    }

    /// Region a prefecture code belongs to, `None` outside 1..=47.
    pub fn of(code: u32) -> Option<Region> {
        Region::ALL
            .into_iter()
            .find(|r| r.prefecture_codes().contains(&code))
    }
}

impl fmt::Display for Region {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
