#[cfg(test)]
mod tests {
    use phorm_core::{Error, LazyEntityList};
    use std::{cell::Cell, rc::Rc};

    fn counted(values: &[&'static str], counter: &Rc<Cell<usize>>) -> LazyEntityList<String> {
        let mut list = LazyEntityList::with_capacity(values.len());
        for value in values.iter().copied() {
            let counter = counter.clone();
            list.add_resolver(move || {
                counter.set(counter.get() + 1);
                if value.is_empty() {
                    return Err(Error::msg("Empty value"));
                }
                Ok(value.to_string())
            });
        }
        list
    }

    #[test]
    fn resolves_on_access() {
        let counter = Rc::new(Cell::new(0));
        let mut list = counted(&["alpha", "beta", "gamma"], &counter);
        assert_eq!(list.len(), 3);
        assert_eq!(list.resolved(), 0);
        assert_eq!(counter.get(), 0);

        // One iteration step runs one resolver
        assert_eq!(list.iter().next().unwrap().unwrap(), "alpha");
        assert_eq!(counter.get(), 1);
        assert_eq!(list.resolved(), 1);
        assert_eq!(list.len(), 3);

        assert_eq!(list.get(1).unwrap().unwrap(), "beta");
        assert_eq!(counter.get(), 2);
        assert_eq!(list.resolved(), 2);
        assert!(list.contains(&"alpha".to_string()));
        assert!(!list.contains(&"gamma".to_string()));

        let values = list.iter().collect::<Result<Vec<_>, _>>().unwrap();
        assert_eq!(values, ["alpha", "beta", "gamma"]);
        assert_eq!(counter.get(), 3);
        // Already resolved entries are kept
        assert_eq!(list.iter().count(), 3);
        assert_eq!(counter.get(), 3);
        assert!(list.contains(&"gamma".to_string()));
        assert!(list.get(3).is_none());
    }

    #[test]
    fn fill_resolves_what_fits() {
        let counter = Rc::new(Cell::new(0));
        let mut list = counted(&["a", "b", "c", "d"], &counter);
        let mut destination = vec![String::new(); 2];
        assert_eq!(list.fill(&mut destination).unwrap(), 2);
        assert_eq!(destination, ["a", "b"]);
        assert_eq!(counter.get(), 2);

        let mut destination = vec![String::new(); 6];
        assert_eq!(list.fill(&mut destination).unwrap(), 4);
        assert_eq!(destination[..4], ["a", "b", "c", "d"]);
        assert_eq!(destination[4], "");
        assert_eq!(counter.get(), 4);
    }

    #[test]
    fn failed_entries() {
        let counter = Rc::new(Cell::new(0));
        let mut list = counted(&["first", "", "third"], &counter);
        assert!(list.get(1).unwrap().is_err());
        assert_eq!(list.len(), 2);
        assert_eq!(list.get(1).unwrap().unwrap(), "third");
        assert_eq!(list.into_vec().unwrap(), ["first", "third"]);
        assert_eq!(counter.get(), 3);
    }

    #[test]
    fn into_vec_propagates_errors() {
        let counter = Rc::new(Cell::new(0));
        let list = counted(&["x", ""], &counter);
        assert!(list.into_vec().is_err());
    }

    #[test]
    fn resolved_entries() {
        let mut list: LazyEntityList<i32> = [1, 2].into_iter().collect();
        list.push(3);
        list.add_resolver(|| Ok(4));
        assert_eq!(list.len(), 4);
        assert_eq!(list.resolved(), 3);
        assert!(!list.is_empty());
        assert!(LazyEntityList::<i32>::default().is_empty());
        assert_eq!(
            list.into_iter().collect::<Result<Vec<_>, _>>().unwrap(),
            [1, 2, 3, 4]
        );
    }
}
