//! The promotion record exchanged with the agent backend.
//!
//! Records are created server-side; the client only ever holds copies it
//! received or edited locally. Fields the backend sends that are not modelled
//! here are kept in [`PromotionRecord::extra`] and written back unchanged.

use rust_decimal::prelude::FromPrimitive as _;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::completeness::coerce_text;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PromotionRecord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub promo_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session_id: Option<String>,

    // Required for completeness
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub titulo: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mecanica: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub descricao: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub segmentacao: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub periodo_inicio: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub periodo_fim: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub condicoes: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recompensas: Option<String>,

    // Channel and audience
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub canal: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub publico_alvo: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cluster: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub publico_detalhado: Option<String>,

    // Financial
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ticket_minimo: Option<Decimal>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ticket_maximo: Option<Decimal>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub volume_minimo: Option<Decimal>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub limite_verba: Option<Decimal>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub desconto_percentual: Option<Decimal>,

    // Product
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub produtos: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub linha_produto: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tipo_mix: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub categoria: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fabricante: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub codigo_interno: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub grupo: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub combo: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sku_ean: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub descricao_sku: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub brinde_sku: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub qt_minima: Option<Decimal>,

    // Management
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_mensal: Option<Decimal>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub centro_custo: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub periodo_apuracao: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub promocao_exclusiva: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prioridade_promocao: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gatilhos_ean_ou_familias: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub regra_composicao_familia: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub observacoes: Option<String>,

    // Lifecycle
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sent_at: Option<String>,

    /// Backend fields this client does not model.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Modelled fields holding free text.
const TEXT_FIELDS: [&str; 35] = [
    "id",
    "promo_id",
    "session_id",
    "titulo",
    "mecanica",
    "descricao",
    "segmentacao",
    "periodo_inicio",
    "periodo_fim",
    "condicoes",
    "recompensas",
    "canal",
    "publico_alvo",
    "cluster",
    "publico_detalhado",
    "linha_produto",
    "tipo_mix",
    "categoria",
    "fabricante",
    "codigo_interno",
    "grupo",
    "combo",
    "sku_ean",
    "descricao_sku",
    "brinde_sku",
    "centro_custo",
    "periodo_apuracao",
    "promocao_exclusiva",
    "prioridade_promocao",
    "gatilhos_ean_ou_familias",
    "regra_composicao_familia",
    "observacoes",
    "status",
    "created_at",
    "sent_at",
];

/// Modelled fields holding numbers.
const DECIMAL_FIELDS: [&str; 7] = [
    "ticket_minimo",
    "ticket_maximo",
    "volume_minimo",
    "limite_verba",
    "desconto_percentual",
    "qt_minima",
    "target_mensal",
];

impl PromotionRecord {
    /// Narrows a loosely-typed backend value into a record.
    ///
    /// The agent backend is not strict about types: text fields may arrive
    /// as numbers, money as strings, products as a comma-separated string.
    /// Known fields are coerced to their modelled type; values that cannot be
    /// coerced become absent. Returns `None` when `value` is not an object.
    #[must_use]
    pub fn from_wire(value: &Value) -> Option<Self> {
        let Value::Object(map) = value else {
            return None;
        };
        let mut map = map.clone();
        for (key, field) in &mut map {
            if let Some(replacement) = coerce_wire_field(key, field) {
                *field = replacement;
            }
        }
        match serde_json::from_value(Value::Object(map)) {
            Ok(record) => Some(record),
            Err(e) => {
                tracing::warn!(error = %e, "discarding malformed promotion record");
                None
            }
        }
    }

    /// Returns the text value of a string-typed field by its wire name.
    ///
    /// Used by the completeness evaluator; decimal and list fields are not
    /// reachable here.
    #[must_use]
    pub fn text_field(&self, name: &str) -> Option<&str> {
        let value = match name {
            "id" => &self.id,
            "promo_id" => &self.promo_id,
            "session_id" => &self.session_id,
            "titulo" => &self.titulo,
            "mecanica" => &self.mecanica,
            "descricao" => &self.descricao,
            "segmentacao" => &self.segmentacao,
            "periodo_inicio" => &self.periodo_inicio,
            "periodo_fim" => &self.periodo_fim,
            "condicoes" => &self.condicoes,
            "recompensas" => &self.recompensas,
            "canal" => &self.canal,
            "publico_alvo" => &self.publico_alvo,
            "cluster" => &self.cluster,
            "publico_detalhado" => &self.publico_detalhado,
            "status" => &self.status,
            "observacoes" => &self.observacoes,
            _ => return self.extra.get(name).and_then(Value::as_str),
        };
        value.as_deref()
    }

    /// Returns a copy of this record stamped with `session_id`.
    #[must_use]
    pub fn with_session(&self, session_id: &str) -> Self {
        Self {
            session_id: Some(session_id.to_owned()),
            ..self.clone()
        }
    }

    /// Title for list display, falling back when the draft has none.
    #[must_use]
    pub fn display_title(&self) -> &str {
        self.titulo
            .as_deref()
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .unwrap_or("Promoção sem título")
    }

    /// Segment for list display: `segmentacao`, then `publico_alvo`.
    #[must_use]
    pub fn display_segment(&self) -> &str {
        [self.segmentacao.as_deref(), self.publico_alvo.as_deref()]
            .into_iter()
            .flatten()
            .map(str::trim)
            .find(|s| !s.is_empty())
            .unwrap_or("Público geral")
    }

    /// Sets a field from user-supplied text, as done by the edit form.
    ///
    /// Known string fields are replaced; decimal fields are parsed; an empty
    /// value clears the field. Anything else lands in [`Self::extra`].
    ///
    /// # Errors
    ///
    /// Returns a message when a decimal field receives non-numeric text.
    pub fn set_field(&mut self, name: &str, raw: &str) -> Result<(), String> {
        let text = (!raw.trim().is_empty()).then(|| raw.to_owned());
        let decimal = || -> Result<Option<Decimal>, String> {
            match text.as_deref() {
                None => Ok(None),
                Some(t) => t
                    .trim()
                    .replace(',', ".")
                    .parse::<Decimal>()
                    .map(Some)
                    .map_err(|e| format!("campo '{name}' espera um número: {e}")),
            }
        };

        match name {
            "titulo" => self.titulo = text,
            "mecanica" => self.mecanica = text,
            "descricao" => self.descricao = text,
            "segmentacao" => self.segmentacao = text,
            "periodo_inicio" => self.periodo_inicio = text,
            "periodo_fim" => self.periodo_fim = text,
            "condicoes" => self.condicoes = text,
            "recompensas" => self.recompensas = text,
            "canal" => self.canal = text,
            "publico_alvo" => self.publico_alvo = text,
            "cluster" => self.cluster = text,
            "publico_detalhado" => self.publico_detalhado = text,
            "linha_produto" => self.linha_produto = text,
            "tipo_mix" => self.tipo_mix = text,
            "categoria" => self.categoria = text,
            "fabricante" => self.fabricante = text,
            "codigo_interno" => self.codigo_interno = text,
            "grupo" => self.grupo = text,
            "combo" => self.combo = text,
            "sku_ean" => self.sku_ean = text,
            "descricao_sku" => self.descricao_sku = text,
            "brinde_sku" => self.brinde_sku = text,
            "centro_custo" => self.centro_custo = text,
            "periodo_apuracao" => self.periodo_apuracao = text,
            "promocao_exclusiva" => self.promocao_exclusiva = text,
            "prioridade_promocao" => self.prioridade_promocao = text,
            "gatilhos_ean_ou_familias" => self.gatilhos_ean_ou_familias = text,
            "regra_composicao_familia" => self.regra_composicao_familia = text,
            "observacoes" => self.observacoes = text,
            "ticket_minimo" => self.ticket_minimo = decimal()?,
            "ticket_maximo" => self.ticket_maximo = decimal()?,
            "volume_minimo" => self.volume_minimo = decimal()?,
            "limite_verba" => self.limite_verba = decimal()?,
            "desconto_percentual" => self.desconto_percentual = decimal()?,
            "qt_minima" => self.qt_minima = decimal()?,
            "target_mensal" => self.target_mensal = decimal()?,
            "produtos" => {
                self.produtos = text.map(|t| {
                    t.split(',')
                        .map(str::trim)
                        .filter(|p| !p.is_empty())
                        .map(str::to_owned)
                        .collect()
                });
            }
            "id" | "promo_id" | "session_id" | "status" | "created_at" | "sent_at" => {
                return Err(format!("campo '{name}' é gerenciado pelo servidor"));
            }
            other => match text {
                Some(t) => {
                    self.extra.insert(other.to_owned(), Value::String(t));
                }
                None => {
                    self.extra.remove(other);
                }
            },
        }
        Ok(())
    }
}

/// Replacement for a wire value that does not match its modelled type.
fn coerce_wire_field(key: &str, value: &Value) -> Option<Value> {
    if TEXT_FIELDS.contains(&key) {
        return match value {
            Value::Null | Value::String(_) => None,
            Value::Number(_) | Value::Bool(_) | Value::Array(_) => {
                coerce_text(value).map(|text| Value::String(text.into_owned()))
            }
            Value::Object(_) => Some(Value::String(value.to_string())),
        };
    }
    if DECIMAL_FIELDS.contains(&key) {
        return match value {
            Value::Null => None,
            Value::Number(n) => n
                .as_f64()
                .and_then(Decimal::from_f64)
                .is_none()
                .then_some(Value::Null),
            Value::String(s) => Some(
                s.trim()
                    .replace(',', ".")
                    .parse::<f64>()
                    .ok()
                    .filter(|f| Decimal::from_f64(*f).is_some())
                    .and_then(serde_json::Number::from_f64)
                    .map_or(Value::Null, Value::Number),
            ),
            Value::Bool(_) | Value::Array(_) | Value::Object(_) => Some(Value::Null),
        };
    }
    if key == "produtos" {
        return match value {
            Value::Null => None,
            Value::String(s) => Some(Value::Array(
                s.split(',')
                    .map(str::trim)
                    .filter(|p| !p.is_empty())
                    .map(|p| Value::String(p.to_owned()))
                    .collect(),
            )),
            Value::Array(items) => Some(Value::Array(
                items
                    .iter()
                    .filter(|item| !item.is_null())
                    .map(|item| match item {
                        Value::String(s) => Value::String(s.clone()),
                        other => Value::String(other.to_string()),
                    })
                    .collect(),
            )),
            Value::Number(_) | Value::Bool(_) | Value::Object(_) => Some(Value::Null),
        };
    }
    None
}
