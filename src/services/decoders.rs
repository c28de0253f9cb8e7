// src/services/decoders.rs
//
// Tabelas e decodificadores dos formatos de cada canal.
// Nova loja, novo pacote ou novo horário: muda-se só a tabela aqui.

use chrono::{Days, NaiveDate};
use serde_json::Value;

/// Resultado de decodificar um payload de canal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decoded<T> {
    Parsed(T),
    /// Falta um campo obrigatório (o fluxo ainda não terminou).
    Incomplete(String),
    /// Algum campo veio com valor fora das tabelas.
    Unrecognized(String),
}

impl<T> Decoded<T> {
    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Decoded<U> {
        match self {
            Decoded::Parsed(value) => Decoded::Parsed(f(value)),
            Decoded::Incomplete(reason) => Decoded::Incomplete(reason),
            Decoded::Unrecognized(reason) => Decoded::Unrecognized(reason),
        }
    }
}

// =============================================================================
//  TABELAS
// =============================================================================

/// Nome de exibição de cada loja, como aparece no formulário do WhatsApp.
pub const STORE_DIRECTORY: [(i32, &str); 3] = [
    (1, "StrikeTheBall - Sector 104"),
    (2, "StrikeTheBall - Sector 93"),
    (3, "StrikeTheBall - Sector 45"),
];

/// Títulos canônicos da lista de pacotes do WhatsApp.
pub const PACKAGE_LABELS: [(&str, i32); 4] = [
    ("5 Overs - 300 INR", 1),
    ("10 Overs - 500 INR", 2),
    ("20 Overs - 1000 INR", 3),
    ("40 Overs - 1500 INR", 4),
];

// Opção "mais de 40" da lista
const OPEN_ENDED_OVERS: (&str, i32) = ("40+", 40);

// Chaves do formulário (WhatsApp Flow) de loja/data/horário
pub const FLOW_STORE_KEY: &str = "screen_0_Select_Store_0";
pub const FLOW_DATE_KEY: &str = "screen_0_Select_Date_1";
pub const FLOW_TIME_KEY: &str = "screen_0_Select_Time_Slot_2";

pub const KEYPRESS_SEPARATOR: &str = "-DG-";
const KEYPRESS_GROUPS: usize = 5;

// Posição 3 do IVR: "5" é o pedido avulso, sem overs definidos
const IVR_OVERS_TIERS: [(&str, i32); 5] = [("1", 10), ("2", 20), ("3", 30), ("4", 40), ("5", 0)];
const IVR_STORES: [(&str, i32); 3] = [("1", 1), ("2", 2), ("3", 3)];
const IVR_DATE_OFFSETS: [(&str, u64); 3] = [("1", 0), ("2", 1), ("3", 2)];
const IVR_TIME_SLOTS: [(&str, &str); 3] = [("1", "Morning"), ("2", "Afternoon"), ("3", "Evening")];

fn lookup<K: PartialEq + ?Sized, V: Copy>(table: &[(&K, V)], key: &K) -> Option<V> {
    table.iter().find(|(k, _)| *k == key).map(|(_, v)| *v)
}

pub fn store_by_name(name: &str) -> Option<i32> {
    let name = name.trim();
    STORE_DIRECTORY
        .iter()
        .find(|(_, display)| display.eq_ignore_ascii_case(name))
        .map(|(id, _)| *id)
}

// =============================================================================
//  ESCOLHA DE PACOTE / OVERS (lista do WhatsApp)
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Selection {
    Package { package_id: i32 },
    Custom { overs: i32 },
}

/// Classifica o texto escolhido na lista do WhatsApp.
///
/// Ordem de precedência:
/// 1. contém "INR" e "Overs": um dos títulos canônicos, senão pacote inválido;
/// 2. contém só "Overs": avulso, com o número inicial (ou "40+" = 40);
/// 3. qualquer outra coisa: o texto inteiro precisa ser um número de overs.
pub fn classify_selection(text: &str) -> Decoded<Selection> {
    let text = text.trim();

    if text.contains("INR") && text.contains("Overs") {
        return match lookup(&PACKAGE_LABELS, text) {
            Some(package_id) => Decoded::Parsed(Selection::Package { package_id }),
            None => Decoded::Unrecognized(format!("Invalid Package: {:?}", text)),
        };
    }

    if text.starts_with(OPEN_ENDED_OVERS.0) {
        return Decoded::Parsed(Selection::Custom { overs: OPEN_ENDED_OVERS.1 });
    }

    if text.contains("Overs") {
        let digits: String = text.chars().take_while(|c| c.is_ascii_digit()).collect();
        return match digits.parse::<i32>() {
            Ok(overs) => Decoded::Parsed(Selection::Custom { overs }),
            Err(_) => Decoded::Unrecognized(format!("sem número de overs em {:?}", text)),
        };
    }

    match text.parse::<i32>() {
        Ok(overs) => Decoded::Parsed(Selection::Custom { overs }),
        Err(_) => Decoded::Unrecognized(format!("não é uma escolha de overs: {:?}", text)),
    }
}

// =============================================================================
//  FORMULÁRIO DE LOJA / DATA / HORÁRIO (WhatsApp Flow)
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlowSelection {
    pub store_id: i32,
    pub date: NaiveDate,
    pub time: String,
}

// Os valores do Flow vêm como "<ordem>_<texto>", ex.: "0_Morning"
fn strip_ordinal(value: &str) -> &str {
    match value.split_once('_') {
        Some((prefix, rest)) if !prefix.is_empty() && prefix.chars().all(|c| c.is_ascii_digit()) => rest,
        _ => value,
    }
}

fn flow_field<'a>(form: &'a Value, key: &str) -> Option<&'a str> {
    form.get(key)
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|v| !v.is_empty())
}

pub fn decode_flow_form(form: &Value) -> Decoded<FlowSelection> {
    let Some(store) = flow_field(form, FLOW_STORE_KEY) else {
        return Decoded::Incomplete(format!("falta {}", FLOW_STORE_KEY));
    };
    let Some(date) = flow_field(form, FLOW_DATE_KEY) else {
        return Decoded::Incomplete(format!("falta {}", FLOW_DATE_KEY));
    };
    let Some(time) = flow_field(form, FLOW_TIME_KEY) else {
        return Decoded::Incomplete(format!("falta {}", FLOW_TIME_KEY));
    };

    let store_name = strip_ordinal(store).replace('_', " ");
    let Some(store_id) = store_by_name(&store_name) else {
        return Decoded::Unrecognized(format!("loja desconhecida {:?}", store_name));
    };

    let Ok(date) = NaiveDate::parse_from_str(date, "%Y-%m-%d") else {
        return Decoded::Unrecognized(format!("data inválida {:?}", date));
    };

    let time = strip_ordinal(time).trim();
    if time.is_empty() {
        return Decoded::Incomplete(format!("{} vazio", FLOW_TIME_KEY));
    }

    Decoded::Parsed(FlowSelection { store_id, date, time: time.to_string() })
}

// =============================================================================
//  TECLAS DO IVR
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IvrSelection {
    pub store_id: i32,
    pub overs: i32,
    pub date: NaiveDate,
    pub time: &'static str,
}

/// Decodifica `confirmação-DG-loja-DG-faixa-DG-data-DG-horário`.
///
/// A data é relativa a `today` (dia do processamento, não da ligação).
pub fn decode_keypress(keypress: &str, today: NaiveDate) -> Decoded<IvrSelection> {
    let keypress = keypress.trim();
    if keypress.is_empty() {
        return Decoded::Incomplete("sem teclas".to_string());
    }

    let groups: Vec<&str> = keypress.split(KEYPRESS_SEPARATOR).map(str::trim).collect();
    if groups.len() < KEYPRESS_GROUPS {
        return Decoded::Incomplete(format!("{} de {} grupos de teclas", groups.len(), KEYPRESS_GROUPS));
    }
    if groups.len() > KEYPRESS_GROUPS {
        return Decoded::Unrecognized(format!("{} grupos de teclas", groups.len()));
    }

    if groups[0] != "1" {
        return Decoded::Unrecognized(format!("reserva não confirmada (tecla {:?})", groups[0]));
    }
    let Some(store_id) = lookup(&IVR_STORES, groups[1]) else {
        return Decoded::Unrecognized(format!("tecla de loja desconhecida {:?}", groups[1]));
    };
    let Some(overs) = lookup(&IVR_OVERS_TIERS, groups[2]) else {
        return Decoded::Unrecognized(format!("tecla de overs desconhecida {:?}", groups[2]));
    };
    let Some(offset) = lookup(&IVR_DATE_OFFSETS, groups[3]) else {
        return Decoded::Unrecognized(format!("tecla de data desconhecida {:?}", groups[3]));
    };
    let Some(time) = lookup(&IVR_TIME_SLOTS, groups[4]) else {
        return Decoded::Unrecognized(format!("tecla de horário desconhecida {:?}", groups[4]));
    };
    let Some(date) = today.checked_add_days(Days::new(offset)) else {
        return Decoded::Unrecognized(format!("data fora do intervalo ({} + {})", today, offset));
    };

    Decoded::Parsed(IvrSelection { store_id, overs, date, time })
}
