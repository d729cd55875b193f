// 指数加权的两种形式:
//
// 递推式 (adjust = false)，用于 MACD:
//   y_0 = x_0
//   y_t = α·x_t + (1 − α)·y_{t−1}
//
// 加权均值式 (adjust = true)，用于 RSI 的平均涨跌幅:
//   y_t = Σ (1 − α)^i · x_{t−i} / Σ (1 − α)^i

/// 由跨度换算平滑系数: α = 2 / (span + 1)
pub fn alpha_from_span(span: usize) -> f64 {
    2.0 / (crate::count_f64(span) + 1.0)
}

/// 由质心换算平滑系数: α = 1 / (1 + com)
pub fn alpha_from_com(com: usize) -> f64 {
    1.0 / (1.0 + crate::count_f64(com))
}

/// # Summary
/// 递推式 EMA，以首个观测值为种子。
///
/// # Logic
/// 1. 遇到第一个 `Some` 时以其为初值。
/// 2. 之后每个 `Some` 按 α 递推更新。
/// 3. `None` 输入不更新状态，该行输出沿用上一值。
///
/// # Returns
/// 与输入等长的序列，首个观测值之前为 `None`。
pub fn ema_recursive(values: &[Option<f64>], alpha: f64) -> Vec<Option<f64>> {
    let mut state: Option<f64> = None;
    values
        .iter()
        .map(|x| {
            if let Some(v) = *x {
                state = Some(match state {
                    None => v,
                    Some(prev) => alpha * v + (1.0 - alpha) * prev,
                });
            }
            state
        })
        .collect()
}

/// # Summary
/// 加权均值式 EMA，带最少观测数门槛。
///
/// # Logic
/// 1. 分子 num_t = x_t + (1 − α)·num_{t−1}，分母 den_t = 1 + (1 − α)·den_{t−1}。
/// 2. 观测数达到 `min_periods` 之前输出 `None`。
///
/// # Returns
/// 与输入等长的序列。
pub fn ema_weighted(values: &[f64], alpha: f64, min_periods: usize) -> Vec<Option<f64>> {
    let decay = 1.0 - alpha;
    let mut num = 0.0;
    let mut den = 0.0;
    values
        .iter()
        .enumerate()
        .map(|(i, &x)| {
            num = x + decay * num;
            den = 1.0 + decay * den;
            if i + 1 >= min_periods {
                Some(num / den)
            } else {
                None
            }
        })
        .collect()
}
