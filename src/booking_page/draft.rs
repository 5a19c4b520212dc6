//! Черновик бронирования: чистая функция от выбранных мест.

use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BookingDraft {
    /// id мест через запятую, в порядке кликов
    pub seat_ids: String,
    /// сумма цен без округления, округляется только при выводе
    pub total_price: f64,
}

impl BookingDraft {
    pub fn is_empty(&self) -> bool {
        self.seat_ids.is_empty()
    }

    /// Строка с двумя знаками после точки, как в поле `total_price`.
    pub fn total_price_text(&self) -> String {
        format_price(self.total_price)
    }
}

/// Собирает черновик по выбору. `price_of` возвращает цену места,
/// для исчезнувшего места ожидается 0.
pub fn compute_draft<F>(selection: &[String], price_of: F) -> BookingDraft
where
    F: Fn(&str) -> f64,
{
    let total: f64 = selection.iter().map(|id| price_of(id)).sum();
    BookingDraft {
        seat_ids: selection.join(","),
        total_price: total,
    }
}

/// Два знака после точки. Округляется точное двоичное значение,
/// ровно посередине между копейками округляем от нуля.
pub fn format_price(value: f64) -> String {
    let magnitude = value.abs();
    // x.xx5 точно представимо только при дробной части кратной 1/8
    let eighths = magnitude * 8.0;
    let text = if eighths.fract() == 0.0 && eighths % 2.0 == 1.0 {
        format!("{:.2}", (magnitude * 100.0).ceil() / 100.0)
    } else {
        format!("{:.2}", magnitude)
    };
    // -0.00 не показываем
    if value < 0.0 && text.bytes().any(|b| matches!(b, b'1'..=b'9')) {
        format!("-{text}")
    } else {
        text
    }
}

/// Цена из `data-price`: берётся самый длинный числовой префикс,
/// пустое, нечисловое и бесконечное значение дают 0.
pub fn parse_price(raw: Option<&str>) -> f64 {
    let Some(raw) = raw else {
        return 0.0;
    };
    let s = raw.trim_start();
    let bytes = s.as_bytes();
    let len = bytes.len();
    let mut end = 0;

    if end < len && (bytes[end] == b'+' || bytes[end] == b'-') {
        end += 1;
    }
    let int_start = end;
    while end < len && bytes[end].is_ascii_digit() {
        end += 1;
    }
    let mut digits = end - int_start;

    if end < len && bytes[end] == b'.' {
        let frac_start = end + 1;
        let mut frac_end = frac_start;
        while frac_end < len && bytes[frac_end].is_ascii_digit() {
            frac_end += 1;
        }
        if digits + (frac_end - frac_start) > 0 {
            digits += frac_end - frac_start;
            end = frac_end;
        }
    }
    if digits == 0 {
        return 0.0;
    }

    if end < len && (bytes[end] == b'e' || bytes[end] == b'E') {
        let mut exp_end = end + 1;
        if exp_end < len && (bytes[exp_end] == b'+' || bytes[exp_end] == b'-') {
            exp_end += 1;
        }
        let exp_digits = exp_end;
        while exp_end < len && bytes[exp_end].is_ascii_digit() {
            exp_end += 1;
        }
        if exp_end > exp_digits {
            end = exp_end;
        }
    }

    s[..end]
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
        .unwrap_or(0.0)
}
