//! Reference data for other conversation games
//!
//! The mode-select screen links to an informational browser of other
//! party games people can play with the same group. The entries here are
//! display-only reference data: the session controller hands them to the
//! presentation layer and nothing ever feeds back into game state.

use garde::Validate;
use serde::{Deserialize, Serialize};

/// An entry in the other-games browser
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Validate)]
pub struct OtherGame {
    /// Identifier, unique within the collection
    #[garde(skip)]
    pub id: u32,
    /// Display name of the game
    #[garde(length(min = 1))]
    pub title: String,
    /// One-line pitch shown under the title
    #[garde(length(min = 1))]
    pub description: String,
    /// Rules, one bullet per entry
    #[garde(skip)]
    pub rules: Vec<String>,
    /// Example rounds or prompts, one per entry
    #[garde(skip)]
    pub examples: Vec<String>,
}

/// Returns the built-in other-games collection
///
/// The embedded set shipped with the game; an embedding layer can show
/// its own collection instead by constructing [`OtherGame`] values.
pub fn builtin() -> Vec<OtherGame> {
    fn strings(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| (*s).to_owned()).collect()
    }

    vec![
        OtherGame {
            id: 1,
            title: "ワードウルフ".to_owned(),
            description: "少数派のお題を持つ「ウルフ」を会話から探し出すゲーム".to_owned(),
            rules: strings(&[
                "全員にお題が配られるが、1人だけ違うお題になっている",
                "お題を直接言わずに、お題について順番に話す",
                "制限時間が来たら、ウルフだと思う人を全員で指差す",
                "ウルフが当てられたら市民の勝ち、逃げ切ったらウルフの勝ち",
            ]),
            examples: strings(&[
                "市民のお題「きのこの山」、ウルフのお題「たけのこの里」",
                "市民のお題「海」、ウルフのお題「プール」",
            ]),
        },
        OtherGame {
            id: 2,
            title: "NGワードゲーム".to_owned(),
            description: "自分だけ見えないNGワードを言ったら負けの心理戦".to_owned(),
            rules: strings(&[
                "各自の額にNGワードを書いたカードを貼る（本人には見えない）",
                "普通に会話しながら、相手にNGワードを言わせるよう誘導する",
                "自分のNGワードを口にしたらその場で脱落",
                "最後まで残った人の勝ち",
            ]),
            examples: strings(&[
                "NGワード「たしかに」を相槌で言わせる",
                "NGワード「ビール」を乾杯の流れで言わせる",
            ]),
        },
        OtherGame {
            id: 3,
            title: "第一印象ゲーム".to_owned(),
            description: "「〜な人は誰？」でお互いの第一印象を当て合うゲーム".to_owned(),
            rules: strings(&[
                "お題の「〜な人」に一番当てはまる人を、せーので指差す",
                "一番多く指をさされた人が理由を聞ける",
                "本人の自覚と周りの印象のギャップを楽しむ",
            ]),
            examples: strings(&[
                "「一番朝に弱そうな人は？」",
                "「一番貯金してそうな人は？」",
                "「学生時代モテたでしょって人は？」",
            ]),
        },
    ]
}
