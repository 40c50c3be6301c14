use crate::{
    ConsoleMessage, Contract, EntityDecoder, EntityShape, GenSpec, GenSpecResult,
    LazyEntityList, PhormError, PredicateFilter, Result, RowLabeled, RowSource, Settings,
};
use std::any::Any;

/// Reads result sets from a [`RowSource`] into entities.
#[derive(Debug, Clone, Default)]
pub struct ResultReader {
    pub decoder: EntityDecoder,
}

impl ResultReader {
    pub fn new(settings: Settings) -> Self {
        Self {
            decoder: EntityDecoder::new(settings),
        }
    }

    pub fn settings(&self) -> &Settings {
        &self.decoder.settings
    }

    /// Next row of the current result set. Read failures become console messages when
    /// interception is enabled, otherwise they are returned.
    pub fn next_row(&self, source: &mut impl RowSource) -> Result<Option<RowLabeled>> {
        loop {
            match source.advance() {
                Ok(true) => return Ok(Some(source.current())),
                Ok(false) => return Ok(None),
                Err(e) if self.settings().intercept_row_errors => {
                    self.settings().diagnostics.console_message(&ConsoleMessage {
                        is_error: true,
                        source: "row source".into(),
                        message: format!("{e:#}"),
                    });
                }
                Err(e) => return Err(e),
            }
        }
    }

    /// Remaining rows of the current result set.
    pub fn rows(&self, source: &mut impl RowSource) -> Result<Vec<RowLabeled>> {
        let mut result = Vec::new();
        while let Some(row) = self.next_row(source)? {
            result.push(row);
        }
        Ok(result)
    }

    /// First row of the current result set. With strict result size a second row fails the
    /// read, otherwise it is ignored.
    pub fn read_single<T: Contract>(&self, source: &mut impl RowSource) -> Result<Option<T>> {
        let Some(row) = self.next_row(source)? else {
            return Ok(None);
        };
        if self.settings().strict_result_size && self.next_row(source)?.is_some() {
            let error = PhormError::UnexpectedMultipleRows {
                entity: EntityShape::of::<T>()?.type_name.into(),
            };
            log::error!("{error}");
            return Err(error.into());
        }
        self.decoder.decode::<T>(&row).map(Some)
    }

    /// Every row of the current result set, then the following result sets attached to their
    /// parents as declared by the resultset associations of `T`.
    pub fn read_all<T: Contract>(&self, source: &mut impl RowSource) -> Result<Vec<T>> {
        let shape = EntityShape::of::<T>()?;
        let mut result = self
            .rows(source)?
            .iter()
            .map(|row| self.decoder.decode_with::<T>(&shape, row))
            .collect::<Result<Vec<_>>>()?;
        let Some(last) = shape.resultsets.iter().map(|v| v.order).max() else {
            return Ok(result);
        };
        for order in 0..=last {
            if !source.next_result_set() {
                log::debug!(
                    "`{}` declares result set {order} but the source has no more result sets",
                    shape.type_name
                );
                break;
            }
            let rows = self.rows(source)?;
            for resultset in shape.resultsets.iter().filter(|v| v.order == order) {
                let children = rows
                    .iter()
                    .map(|row| resultset.decode(&self.decoder, row))
                    .collect::<Result<Vec<_>>>()?;
                for parent in &mut result {
                    resultset.attach(parent as &mut dyn Any, &children)?;
                }
            }
        }
        Ok(result)
    }

    /// Every row of the current result set, decoded on first access.
    pub fn read_lazy<T: Contract>(&self, source: &mut impl RowSource) -> Result<LazyEntityList<T>> {
        let shape = EntityShape::of::<T>()?;
        let rows = self.rows(source)?;
        let mut result = LazyEntityList::with_capacity(rows.len());
        for row in rows {
            let decoder = self.decoder.clone();
            let shape = shape.clone();
            result.add_resolver(move || decoder.decode_with::<T>(&shape, &row));
        }
        Ok(result)
    }

    pub fn read_filtered<T: Contract>(
        &self,
        source: &mut impl RowSource,
        filter: &PredicateFilter<T>,
    ) -> Result<LazyEntityList<T>> {
        filter.filter(&self.decoder, self.rows(source)?)
    }

    pub fn read_genspec<G: Contract>(
        &self,
        source: &mut impl RowSource,
        genspec: &GenSpec<G>,
    ) -> Result<GenSpecResult<G>> {
        genspec.resolve(&self.decoder, &self.rows(source)?)
    }
}
