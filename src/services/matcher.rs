//! 最佳匹配查找
//!
//! 相似度采用 Ratcliff/Obershelp 匹配块算法：反复寻找最长公共连续片段，
//! 再对其左右两侧递归，得分为 `2·M / (|a| + |b|)`，M 为所有匹配块的字符总数。
//! 查询串作为被索引的一侧，长度不少于 200 时忽略出现过于频繁的字符（autojunk）。

use std::collections::HashMap;

use super::corpus::CorpusEntry;

/// 默认最低相似度
pub const DEFAULT_CUTOFF: f64 = 0.5;

/// 触发 autojunk 的最小查询长度
const AUTOJUNK_MIN_LEN: usize = 200;

/// 匹配结果
#[derive(Debug, Clone, PartialEq)]
pub struct MatchOutcome<'a> {
    /// 命中的语料问题
    pub prompt: &'a str,
    /// 该问题在语料中第一次出现时对应的回答
    pub answer: &'a str,
    /// 相似度，范围 [0, 1]
    pub score: f64,
}

/// 针对单个查询串预建索引的序列匹配器，可对多个候选串重复打分
pub struct SequenceMatcher {
    b: Vec<char>,
    b2j: HashMap<char, Vec<usize>>,
}

impl SequenceMatcher {
    pub fn new(query: &str) -> Self {
        let b: Vec<char> = query.chars().collect();
        let mut b2j: HashMap<char, Vec<usize>> = HashMap::new();
        for (j, c) in b.iter().enumerate() {
            b2j.entry(*c).or_default().push(j);
        }

        if b.len() >= AUTOJUNK_MIN_LEN {
            let ntest = b.len() / 100 + 1;
            b2j.retain(|_, positions| positions.len() <= ntest);
        }

        Self { b, b2j }
    }

    /// 候选串与查询串的相似度
    pub fn ratio(&self, candidate: &str) -> f64 {
        let a: Vec<char> = candidate.chars().collect();
        let total = a.len() + self.b.len();
        if total == 0 {
            return 1.0;
        }
        2.0 * self.matching_characters(&a) as f64 / total as f64
    }

    /// 所有匹配块的字符总数
    fn matching_characters(&self, a: &[char]) -> usize {
        let mut matched = 0;
        let mut queue = vec![(0, a.len(), 0, self.b.len())];
        while let Some((alo, ahi, blo, bhi)) = queue.pop() {
            let (i, j, k) = self.find_longest_match(a, alo, ahi, blo, bhi);
            if k == 0 {
                continue;
            }
            matched += k;
            if alo < i && blo < j {
                queue.push((alo, i, blo, j));
            }
            if i + k < ahi && j + k < bhi {
                queue.push((i + k, ahi, j + k, bhi));
            }
        }
        matched
    }

    /// a[alo..ahi] 与 b[blo..bhi] 的最长公共片段，返回 (i, j, 长度)
    ///
    /// 同长度时取 a 中最靠前、其次 b 中最靠前的片段
    fn find_longest_match(
        &self,
        a: &[char],
        alo: usize,
        ahi: usize,
        blo: usize,
        bhi: usize,
    ) -> (usize, usize, usize) {
        let b = &self.b;
        let (mut best_i, mut best_j, mut best_size) = (alo, blo, 0);

        // j2len[j]: 以 a[i-1] 与 b[j] 结尾的公共片段长度
        let mut j2len: HashMap<usize, usize> = HashMap::new();
        for (i, c) in a.iter().enumerate().take(ahi).skip(alo) {
            let mut new_j2len = HashMap::new();
            if let Some(positions) = self.b2j.get(c) {
                for &j in positions {
                    if j < blo {
                        continue;
                    }
                    if j >= bhi {
                        break;
                    }
                    let k = j
                        .checked_sub(1)
                        .and_then(|prev| j2len.get(&prev))
                        .copied()
                        .unwrap_or(0)
                        + 1;
                    new_j2len.insert(j, k);
                    if k > best_size {
                        best_i = i + 1 - k;
                        best_j = j + 1 - k;
                        best_size = k;
                    }
                }
            }
            j2len = new_j2len;
        }

        // 被 autojunk 剔除的字符不在索引中，向两侧补齐相等的字符
        while best_i > alo && best_j > blo && a[best_i - 1] == b[best_j - 1] {
            best_i -= 1;
            best_j -= 1;
            best_size += 1;
        }
        while best_i + best_size < ahi
            && best_j + best_size < bhi
            && a[best_i + best_size] == b[best_j + best_size]
        {
            best_size += 1;
        }

        (best_i, best_j, best_size)
    }
}

/// 查找与 query 最相似的语料问题并返回其回答
///
/// 同分时保留加载顺序靠前的问题。回答通过重新扫描语料获得：
/// 取第一个问题文本与命中问题相等的条目，因此重复问题总是返回最早加载的回答。
pub fn find_best_match<'a>(
    query: &str,
    corpus: &'a [CorpusEntry],
    cutoff: f64,
) -> Option<MatchOutcome<'a>> {
    let matcher = SequenceMatcher::new(query);

    let mut best: Option<(&'a str, f64)> = None;
    for entry in corpus {
        let score = matcher.ratio(&entry.prompt);
        if best.map_or(true, |(_, top)| score > top) {
            best = Some((entry.prompt.as_str(), score));
        }
    }

    let (prompt, score) = best.filter(|(_, score)| *score >= cutoff)?;
    let answer = corpus
        .iter()
        .find(|entry| entry.prompt == prompt)
        .map(|entry| entry.answer.as_str())?;

    Some(MatchOutcome {
        prompt,
        answer,
        score,
    })
}
